//! Client management controllers.
//!
//! - `POST /clientes` - Register a client and issue its credentials (public)
//! - `GET /clientes` - List all clients

use crate::{
    context::RequestContext,
    error::AppError,
    models::client::{ClientResponse, NewClient},
    response::Envelope,
    state::AppState,
    store::DUPLICATE_EMAIL,
    validation::{field_text, validate_email, validate_name},
};

/// List every client.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "status": 200,
///   "total": 1,
///   "detalle": [
///     { "id": 1, "nombre": "Ana", "apellido": "Perez", "email": "ana@example.com", "id_cliente": "…" }
///   ]
/// }
/// ```
///
/// Secret keys are never listed.
pub async fn index(state: &AppState) -> Result<Envelope, AppError> {
    let clients: Vec<ClientResponse> = state
        .store
        .list_clients()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Envelope::ok(&clients).with_total(clients.len()))
}

/// Register a client.
///
/// # Request Body
///
/// ```json
/// { "nombre": "Ana", "apellido": "Perez", "email": "ana@example.com" }
/// ```
///
/// # Response
///
/// - **201 Created**: `detalle` carries `id_cliente` and `llave_secreta`. This
///   is the only response that ever contains a secret key.
/// - **400**: missing or invalid field
/// - **409**: email already registered
pub async fn create(state: &AppState, ctx: &RequestContext) -> Result<Envelope, AppError> {
    let body = ctx.json_body()?;

    let (Some(nombre), Some(apellido), Some(email)) = (
        field_text(body, "nombre"),
        field_text(body, "apellido"),
        field_text(body, "email"),
    ) else {
        return Err(AppError::BadRequest(
            "Campos requeridos: nombre, apellido, email".to_string(),
        ));
    };

    let nombre = validate_name(&nombre, "nombre")?;
    let apellido = validate_name(&apellido, "apellido")?;
    let email = validate_email(&email)?;

    // The store's unique constraint catches concurrent registrations
    let clients = state.store.list_clients().await?;
    if clients.iter().any(|client| client.email == email) {
        return Err(AppError::Conflict(DUPLICATE_EMAIL.to_string()));
    }

    let credentials = state.issuer.issue(&nombre, &apellido, &email);

    let client = state
        .store
        .insert_client(NewClient {
            nombre,
            apellido,
            email,
            id_cliente: credentials.id_cliente.clone(),
            llave_secreta: credentials.llave_secreta.clone(),
        })
        .await?;
    tracing::info!(client_id = client.id, "client registered");

    Ok(Envelope::created(&credentials)
        .with_message("Cliente creado exitosamente. Se generaron sus credenciales"))
}
