/*!
 * Authentication / authorization gates for the film routes
 *
 * - access: Bearer access token 検証 → AuthCtx を extensions に入れる (401)
 * - role:   AuthCtx の group / role を見て操作を許可する (401 / 403)
 */
pub mod access;
pub mod role;
