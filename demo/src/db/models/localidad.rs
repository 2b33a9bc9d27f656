use model_link::Model;

/// A town or locality; many of them belong to one province.
#[allow(dead_code)]
#[derive(Debug, Clone, Model)]
#[model(name = "localidad", table = "localidades", paranoid)]
pub struct Localidad {
    #[model(default = "Desconocido")]
    pub nombre: Option<String>,
}
