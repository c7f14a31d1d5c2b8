/// Cosine similarity in [-1, 1]. Only an exactly zero-magnitude operand
/// yields 0; tiny non-zero vectors keep their direction. Accumulates in
/// `f64` so squares of small components do not underflow. Non-finite input
/// (NaN or infinite components) also yields 0.
///
/// Callers guarantee equal lengths; extra components of the longer slice
/// are ignored.
pub fn cosine_similarity(query: &[f32], candidate: &[f32]) -> f32 {
    let (mut dot, mut qq, mut cc) = (0.0f64, 0.0f64, 0.0f64);
    for (q, c) in query.iter().zip(candidate) {
        let (q, c) = (f64::from(*q), f64::from(*c));
        dot += q * c;
        qq += q * q;
        cc += c * c;
    }

    if qq == 0.0 || cc == 0.0 {
        return 0.0;
    }
    let score = dot / (qq.sqrt() * cc.sqrt());
    if !score.is_finite() {
        return 0.0;
    }
    score.clamp(-1.0, 1.0) as f32
}
