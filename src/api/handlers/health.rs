/*
 * Responsibility
 * - GET /healthz (疎通用, 認証なし)
 */
pub async fn health() -> &'static str {
    "ok"
}
