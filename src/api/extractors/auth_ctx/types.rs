/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - access middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - JWT の署名検証や JWKS の取得は services::auth 側の責務
 */

use crate::services::auth::Claims;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `subject()` は token の `sub`。films の owner として使う
/// - role 判定は Cognito group と `role` claim の和集合
#[derive(Debug, Clone)]
pub struct AuthCtx {
    claims: Claims,
}

impl AuthCtx {
    pub fn new(claims: Claims) -> Self {
        Self { claims }
    }

    pub fn subject(&self) -> &str {
        &self.claims.subject
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.claims.has_role(role)
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }
}
