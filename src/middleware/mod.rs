/*
 * Responsibility
 * - middleware の公開インターフェース
 * - http / cors / security_headers は全ルート、auth は /films 系のみ
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
