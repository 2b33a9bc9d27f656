use model_link::Model;

#[allow(dead_code)]
#[derive(Debug, Clone, Model)]
#[model(name = "provincia", table = "provincias", paranoid)]
pub struct Provincia {
    #[model(default = "Desconocido")]
    pub nombre: Option<String>,
}
