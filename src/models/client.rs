//! Client data models.
//!
//! A client is an external API consumer. It is created once through the
//! public `POST /clientes` endpoint and receives a credential pair
//! (`id_cliente`, `llave_secreta`) that authenticates every later request.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Represents a client record from the database.
///
/// # Database Table
///
/// Maps to the `clientes` table. `email` carries a `UNIQUE` constraint.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Client {
    pub id: i64,

    pub nombre: String,

    pub apellido: String,

    pub email: String,

    /// Public half of the credential pair
    pub id_cliente: String,

    /// Secret half of the credential pair
    ///
    /// Never serialized: the only place it leaves the service is the
    /// creation response.
    pub llave_secreta: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Validated input for inserting a client.
#[derive(Debug, Clone)]
pub struct NewClient {
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub id_cliente: String,
    pub llave_secreta: String,
}

/// Client as shown in listings (secret key removed).
#[derive(Debug, Serialize)]
pub struct ClientResponse {
    pub id: i64,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub id_cliente: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Client> for ClientResponse {
    fn from(client: Client) -> Self {
        Self {
            id: client.id,
            nombre: client.nombre,
            apellido: client.apellido,
            email: client.email,
            id_cliente: client.id_cliente,
            created_at: client.created_at,
            updated_at: client.updated_at,
        }
    }
}

/// Credentials returned once, on creation.
#[derive(Debug, Serialize)]
pub struct IssuedCredentials {
    pub id_cliente: String,
    pub llave_secreta: String,
}
