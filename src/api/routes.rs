/*
 * Responsibility
 * - films API の URL 構造を定義
 * - /films は access (Bearer) 必須、DELETE /films/{id} は admin role も必須
 * - gate は route_layer で掛ける (未知のパスは認証前に 404)
 */
use axum::{
    Router,
    routing::{delete, get},
};

use crate::api::handlers::films::{create_film, delete_film, list_films};
use crate::middleware::auth::{access, role};
use crate::state::AppState;

pub fn routes(state: AppState, admin_role: &str) -> Router<AppState> {
    let films = Router::new().route("/films", get(list_films).post(create_film));

    // role gate runs inside the access gate, so AuthCtx is already present
    let admin = role::apply(
        Router::new().route("/films/{id}", delete(delete_film)),
        role::RequiredRole::new(admin_role),
    );

    access::apply(films.merge(admin), state)
}
