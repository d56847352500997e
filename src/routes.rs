// Route definitions

use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

use crate::error::handle_rejection;
use crate::handlers;
use crate::relay::RelayService;
use crate::store::JsonModelStore;

/// Everything the handlers share
#[derive(Clone)]
pub struct AppState {
    pub relay: RelayService,
    pub models: Arc<JsonModelStore>,
    /// Cap on JSON request bodies, in bytes
    pub body_limit: u64,
}

fn with_relay(
    relay: RelayService,
) -> impl Filter<Extract = (RelayService,), Error = Infallible> + Clone {
    warp::any().map(move || relay.clone())
}

fn with_models(
    models: Arc<JsonModelStore>,
) -> impl Filter<Extract = (Arc<JsonModelStore>,), Error = Infallible> + Clone {
    warp::any().map(move || models.clone())
}

pub fn configure_routes(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let api = warp::path("api");
    let body = warp::body::content_length_limit(state.body_limit).and(warp::body::bytes());

    // POST /api/relay
    let relay = api
        .and(warp::path("relay"))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_relay(state.relay.clone()))
        .and(body.clone())
        .and_then(handlers::relay_handler);

    // GET /api/models
    let list = api
        .and(warp::path("models"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_models(state.models.clone()))
        .and_then(handlers::list_models);

    // POST /api/models
    let create = api
        .and(warp::path("models"))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_models(state.models.clone()))
        .and(body.clone())
        .and_then(handlers::create_model);

    // GET /api/models/active
    let get_active = api
        .and(warp::path("models"))
        .and(warp::path("active"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_models(state.models.clone()))
        .and_then(handlers::get_active_model);

    // POST /api/models/active
    let set_active = api
        .and(warp::path("models"))
        .and(warp::path("active"))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_models(state.models.clone()))
        .and(body.clone())
        .and_then(handlers::set_active_model);

    // POST /api/models/import
    let import = api
        .and(warp::path("models"))
        .and(warp::path("import"))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_models(state.models.clone()))
        .and(body.clone())
        .and_then(handlers::import_models);

    // GET /api/models/export
    let export = api
        .and(warp::path("models"))
        .and(warp::path("export"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_models(state.models.clone()))
        .and_then(handlers::export_models);

    // PUT /api/models/{id}
    let update = api
        .and(warp::path("models"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::put())
        .and(with_models(state.models.clone()))
        .and(body.clone())
        .and_then(handlers::update_model);

    // DELETE /api/models/{id}
    let delete = api
        .and(warp::path("models"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::delete())
        .and(with_models(state.models))
        .and_then(handlers::delete_model);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allow_headers(vec!["content-type"]);

    relay
        .or(list)
        .or(create)
        .or(get_active)
        .or(set_active)
        .or(import)
        .or(export)
        .or(update)
        .or(delete)
        .recover(handle_rejection)
        .with(cors)
}
