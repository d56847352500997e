// Handlers module

pub mod models;
pub mod relay;

pub use models::{
    create_model, delete_model, export_models, get_active_model, import_models, list_models,
    set_active_model, update_model,
};
pub use relay::relay_handler;
