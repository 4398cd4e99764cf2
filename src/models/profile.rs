use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::services::firestore::FirestoreService;

pub const COLLECTION: &str = "usuario";

pub const ROLE_ADMIN: &str = "admin";

/// Customer profile, keyed by the Firebase uid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub nombres: String,
    pub primer_apellido: String,
    #[serde(default)]
    pub segundo_apellido: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub direccion: Option<String>,
    #[serde(default)]
    pub fecha_nacimiento: Option<String>,
    #[serde(default)]
    pub id_rol: Option<String>,
}

impl Profile {
    pub async fn fetch(fs: &FirestoreService, uid: &str) -> AppResult<Option<Self>> {
        let doc = match fs.get(COLLECTION, uid).await? {
            Some(doc) => doc,
            None => return Ok(None),
        };

        doc.decode()
            .map(Some)
            .map_err(|e| AppError::Parse(format!("usuario {}: {}", uid, e)))
    }

    /// The display name orders carry as `cliente_nombre`.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.nombres, self.primer_apellido)
    }

    pub fn is_admin(&self) -> bool {
        self.id_rol.as_deref() == Some(ROLE_ADMIN)
    }
}
