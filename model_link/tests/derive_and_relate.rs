use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::sync::Mutex;

use model_link::schema::generator::DdlGenerator;
use model_link::{
    init_schema, relate, AssociationKind, DataType, DefaultValue, Error, Model, ModelDefinition,
    ModelRegistry, SchemaClient, SyncMode, SyncOptions,
};

#[allow(dead_code)]
#[derive(Model)]
#[model(name = "localidad", table = "localidades", paranoid)]
struct Localidad {
    #[model(default = "Desconocido")]
    nombre: Option<String>,
}

#[allow(dead_code)]
#[derive(Model)]
#[model(name = "provincia", table = "provincias", paranoid)]
struct Provincia {
    #[model(default = "Desconocido")]
    nombre: Option<String>,
}

#[allow(dead_code)]
#[derive(Model)]
#[model(timestamps = false)]
struct Etiqueta {
    #[model(primary_key)]
    codigo: i32,
    #[model(column = "descripcion", text)]
    texto: String,
    activa: bool,
    #[model(skip)]
    cache: Vec<u8>,
}

#[test]
fn derive_maps_fields_to_attributes() {
    let localidad = Localidad::define();

    assert_eq!(localidad.name(), "localidad");
    assert_eq!(localidad.table_name(), "localidades");
    assert!(localidad.options().paranoid);
    assert!(localidad.options().timestamps);

    let nombre = &localidad.attributes()["nombre"];
    assert_eq!(nombre.data_type, DataType::String(255));
    assert!(nombre.allow_null);
    assert_eq!(
        nombre.default_value,
        Some(DefaultValue::Text("Desconocido".to_string()))
    );
}

#[test]
fn derive_honours_field_options() {
    let etiqueta = Etiqueta::define();

    assert_eq!(etiqueta.table_name(), "etiquetas");
    assert!(!etiqueta.options().timestamps);

    let names: Vec<&str> = etiqueta.attributes().keys().map(String::as_str).collect();
    assert_eq!(names, vec!["codigo", "descripcion", "activa"]);
    assert!(etiqueta.attributes()["codigo"].primary_key);
    assert_eq!(etiqueta.attributes()["descripcion"].data_type, DataType::Text);
    assert!(!etiqueta.attributes()["activa"].allow_null);
}

#[test]
fn many_to_one_produces_referencing_table() {
    let mut localidad = Localidad::define();
    let mut provincia = Provincia::define();

    relate(
        "muchos-uno",
        &mut localidad,
        &mut provincia,
        "provincia",
        "localidades",
        "provincia_id",
        None,
        None,
    )
    .unwrap();

    assert_eq!(
        localidad.association("provincia").unwrap().kind,
        AssociationKind::BelongsTo
    );
    assert_eq!(
        provincia.association("localidades").unwrap().kind,
        AssociationKind::HasMany
    );

    let mut registry = ModelRegistry::new();
    registry.define(localidad).unwrap();
    registry.define(provincia).unwrap();
    let schema = registry.to_database_schema(None).unwrap();
    let statements = DdlGenerator::new().create_all(&schema);

    assert_eq!(statements.len(), 2);
    assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS \"provincias\""));
    assert!(statements[1].starts_with("CREATE TABLE IF NOT EXISTS \"localidades\""));
    assert!(statements[1].contains("\"provincia_id\" INTEGER NULL"));
    assert!(statements[1].contains(
        "CONSTRAINT \"fk_localidades_provincia_id\" FOREIGN KEY (\"provincia_id\") \
         REFERENCES \"provincias\" (\"id\") ON DELETE RESTRICT ON UPDATE RESTRICT"
    ));
    assert!(statements[1].contains("\"deleted_at\" TIMESTAMP WITH TIME ZONE NULL"));
}

/// Records what the synchronizer asks of the database
#[derive(Default)]
struct RecordingClient {
    reject_credentials: bool,
    reject_sync: bool,
    calls: Mutex<Vec<String>>,
    synced_with: Mutex<Option<SyncOptions>>,
}

#[async_trait]
impl SchemaClient for RecordingClient {
    async fn authenticate(&self) -> model_link::Result<()> {
        self.calls.lock().unwrap().push("authenticate".to_string());
        if self.reject_credentials {
            return Err(Error::Authentication(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    async fn sync(&self, options: SyncOptions) -> model_link::Result<()> {
        self.calls.lock().unwrap().push("sync".to_string());
        *self.synced_with.lock().unwrap() = Some(options);
        if self.reject_sync {
            return Err(Error::Sync(sqlx::Error::RowNotFound));
        }
        Ok(())
    }
}

#[tokio::test]
async fn each_mode_authenticates_then_syncs_once() {
    for (mode, force, alter) in [
        (SyncMode::Sync, false, false),
        (SyncMode::Force, true, false),
        (SyncMode::Alter, false, true),
    ] {
        let client = RecordingClient::default();

        let ran = init_schema(&client, mode).await.unwrap();

        assert_eq!(ran, mode);
        assert_eq!(*client.calls.lock().unwrap(), vec!["authenticate", "sync"]);
        assert_eq!(
            *client.synced_with.lock().unwrap(),
            Some(SyncOptions { force, alter })
        );
    }
}

#[tokio::test]
async fn failed_authentication_skips_sync() {
    let client = RecordingClient {
        reject_credentials: true,
        ..Default::default()
    };

    let err = init_schema(&client, SyncMode::Force).await.unwrap_err();

    assert!(matches!(err, Error::Authentication(_)));
    assert_eq!(*client.calls.lock().unwrap(), vec!["authenticate"]);
    assert!(client.synced_with.lock().unwrap().is_none());
}

#[tokio::test]
async fn failed_sync_is_returned_after_authenticating() {
    let client = RecordingClient {
        reject_sync: true,
        ..Default::default()
    };

    let result = init_schema(&client, SyncMode::Alter).await;

    assert!(matches!(result, Err(Error::Sync(sqlx::Error::RowNotFound))));
    assert_eq!(*client.calls.lock().unwrap(), vec!["authenticate", "sync"]);
    assert_eq!(
        *client.synced_with.lock().unwrap(),
        Some(SyncOptions {
            force: false,
            alter: true
        })
    );
}
