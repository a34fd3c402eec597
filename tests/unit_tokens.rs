use fren::fren_auth::{TokenCipher, sign_token, verify_token};
use fren::fren_config::{CryptoConfig, JwtConfig};
use fren::fren_core::ErrorKind;

fn get_test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test_secret_key_for_testing_purposes".to_string(),
        token_ttl: 60,
    }
}

#[test]
fn test_sign_token_success() {
    let signed = sign_token(42, 3600, &get_test_jwt_config()).unwrap();

    assert!(!signed.token.is_empty());
    assert!(signed.expires_at > chrono::Utc::now().timestamp());
}

#[test]
fn test_tokens_are_unique() {
    let config = get_test_jwt_config();
    let first = sign_token(42, 3600, &config).unwrap();
    let second = sign_token(42, 3600, &config).unwrap();

    assert_ne!(first.token, second.token);
}

#[test]
fn test_verify_token_success() {
    let config = get_test_jwt_config();
    let signed = sign_token(42, 3600, &config).unwrap();

    let payload = verify_token(&signed.token, &config).unwrap();
    assert_eq!(payload.id, 42);
    assert_eq!(payload.exp, signed.expires_at);
}

#[test]
fn test_verify_token_invalid() {
    let err = verify_token("invalid.token.here", &get_test_jwt_config()).unwrap_err();

    assert_eq!(err.kind, ErrorKind::NotAuthorized);
    assert_eq!(err.details_str(), Some("jwt"));
}

#[test]
fn test_verify_token_wrong_secret() {
    let signed = sign_token(42, 3600, &get_test_jwt_config()).unwrap();
    let other = JwtConfig {
        secret: "another_secret".to_string(),
        token_ttl: 60,
    };

    let err = verify_token(&signed.token, &other).unwrap_err();
    assert_eq!(err.details_str(), Some("jwt"));
}

#[test]
fn test_verify_token_expired() {
    let config = get_test_jwt_config();
    let signed = sign_token(42, -1, &config).unwrap();

    let err = verify_token(&signed.token, &config).unwrap_err();
    assert_eq!(err.details_str(), Some("expired"));
}

#[test]
fn test_stored_token_round_trip() {
    let cipher = TokenCipher::new(&CryptoConfig {
        secret: "crypto".to_string(),
    });
    let signed = sign_token(7, 60, &get_test_jwt_config()).unwrap();

    let stored = cipher.encrypt(&signed.token).unwrap();
    assert_ne!(stored, signed.token);
    assert_eq!(cipher.decrypt(&stored).unwrap(), signed.token);
}
