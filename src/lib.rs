pub mod core;
pub mod llm;
pub mod logs;
pub mod rag;
pub mod server;
pub mod state;
pub mod vector_math;
