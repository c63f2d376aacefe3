//! Client credential derivation.
//!
//! A client's credential pair is a deterministic, one-way function of its
//! validated identity keyed with the application secret
//! (`clave_credenciales`):
//!
//! - `id_cliente`    = HMAC-SHA256(secret, "id_cliente" ‖ nombre ‖ apellido ‖ email)
//! - `llave_secreta` = HMAC-SHA256(secret, "llave_secreta" ‖ email ‖ apellido ‖ nombre)
//!
//! Fields are joined with an ASCII unit separator so that shifting characters
//! between adjacent fields never produces the same input.

use crate::models::client::IssuedCredentials;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SEPARATOR: u8 = 0x1f;

#[derive(Clone)]
pub struct CredentialIssuer {
    key: Vec<u8>,
}

impl std::fmt::Debug for CredentialIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialIssuer").finish_non_exhaustive()
    }
}

impl CredentialIssuer {
    pub fn new(secret: &str) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
        }
    }

    /// Derive the credential pair for an already validated identity.
    pub fn issue(&self, nombre: &str, apellido: &str, email: &str) -> IssuedCredentials {
        IssuedCredentials {
            id_cliente: self.derive("id_cliente", &[nombre, apellido, email]),
            llave_secreta: self.derive("llave_secreta", &[email, apellido, nombre]),
        }
    }

    fn derive(&self, purpose: &str, parts: &[&str]) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC key length is valid");
        mac.update(purpose.as_bytes());
        for part in parts {
            mac.update(&[SEPARATOR]);
            mac.update(part.as_bytes());
        }
        hex::encode(mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let issuer = CredentialIssuer::new("sal");
        let a = issuer.issue("Ana", "Perez", "ana@example.com");
        let b = issuer.issue("Ana", "Perez", "ana@example.com");
        assert_eq!(a.id_cliente, b.id_cliente);
        assert_eq!(a.llave_secreta, b.llave_secreta);
        assert_eq!(a.id_cliente.len(), 64);
        assert_ne!(a.id_cliente, a.llave_secreta);
    }

    #[test]
    fn distinct_identities_get_distinct_pairs() {
        let issuer = CredentialIssuer::new("sal");
        let triples = [
            ("Ana", "Perez", "ana@example.com"),
            ("Ana", "Perez", "ana2@example.com"),
            ("Anap", "erez", "ana@example.com"),
            ("Perez", "Ana", "ana@example.com"),
        ];

        let issued: Vec<_> = triples
            .iter()
            .map(|(n, a, e)| issuer.issue(n, a, e))
            .collect();

        for i in 0..issued.len() {
            for j in (i + 1)..issued.len() {
                assert_ne!(issued[i].id_cliente, issued[j].id_cliente);
                assert_ne!(issued[i].llave_secreta, issued[j].llave_secreta);
            }
        }
    }

    #[test]
    fn secret_changes_the_pair() {
        let a = CredentialIssuer::new("uno").issue("Ana", "Perez", "ana@example.com");
        let b = CredentialIssuer::new("dos").issue("Ana", "Perez", "ana@example.com");
        assert_ne!(a.id_cliente, b.id_cliente);
    }
}
