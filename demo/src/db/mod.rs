//! Database wiring for the demo
//!
//! Builds the client, declares the sample models and relates them. Called
//! once from the composition root; nothing here is global.

pub mod models;

use model_link::{
    build_connection_with, declare_relation, ClientOptions, Client, ConnectionConfig, Link,
    ModelDefinition, Relation,
};

use models::{Localidad, Provincia};

/// Build a client with `Localidad` and `Provincia` defined and related
pub fn build_client(config: &ConnectionConfig, options: ClientOptions) -> model_link::Result<Client> {
    let mut client = build_connection_with(config, options)?;

    let mut localidad = Localidad::define();
    let mut provincia = Provincia::define();

    // A province has many localities; a locality belongs to one province
    declare_relation(Relation::ManyToOne(Link {
        source: &mut localidad,
        target: &mut provincia,
        source_alias: "provincia",
        target_alias: "localidades",
        foreign_key: "provincia_id",
    }))?;

    client.define(localidad)?;
    client.define(provincia)?;

    Ok(client)
}
