pub mod compose;
pub mod dynamic;
pub mod envfile;
pub mod layers;
pub mod maps;
pub mod schedule;
pub mod server_ini;
pub mod validate;
