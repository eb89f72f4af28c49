//! Properties of issued session tokens.

use discord_auth_relay::session::{SESSION_TTL, SessionClaims, SessionSigner};
use jsonwebtoken::errors::ErrorKind;
use time::OffsetDateTime;

const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

fn claims(avatar: Option<&str>) -> SessionClaims {
    SessionClaims {
        discord_id: "80351110224678912".into(),
        username: "nelly".into(),
        discriminator: "0".into(),
        avatar: avatar.map(str::to_string),
    }
}

#[test]
fn test_claims_survive_signing_unchanged() {
    let signer = SessionSigner::new(SECRET);
    for avatar in [None, Some("a_1269e74af4df7417b13759eae50c83dc")] {
        let original = claims(avatar);
        let token = signer.issue(&original).unwrap();
        let decoded = signer.verify(&token).unwrap();
        assert_eq!(decoded.user, original);
    }
}

#[test]
fn test_unicode_username_is_preserved() {
    let signer = SessionSigner::new(SECRET);
    let mut original = claims(None);
    original.username = "ñandú_🦤".into();
    let token = signer.issue(&original).unwrap();
    assert_eq!(signer.verify(&token).unwrap().user.username, "ñandú_🦤");
}

#[test]
fn test_token_valid_just_before_expiry() {
    let signer = SessionSigner::new(SECRET);
    let issued_at = OffsetDateTime::now_utc() - SESSION_TTL + time::Duration::minutes(5);
    let token = signer.issue_at(&claims(None), issued_at).unwrap();
    assert!(signer.verify(&token).is_ok());
}

#[test]
fn test_token_rejected_after_expiry() {
    let signer = SessionSigner::new(SECRET);
    let issued_at = OffsetDateTime::now_utc() - SESSION_TTL - time::Duration::minutes(1);
    let token = signer.issue_at(&claims(None), issued_at).unwrap();
    let err = signer.verify(&token).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
}

#[test]
fn test_token_rejected_with_other_secret() {
    let token = SessionSigner::new(SECRET).issue(&claims(None)).unwrap();
    let err = SessionSigner::new(b"fedcba9876543210fedcba9876543210")
        .verify(&token)
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidSignature));
}

#[test]
fn test_modified_payload_is_rejected() {
    let signer = SessionSigner::new(SECRET);
    let token = signer.issue(&claims(None)).unwrap();
    let other = signer
        .issue(&SessionClaims {
            discord_id: "1".into(),
            ..claims(None)
        })
        .unwrap();

    // Splice the payload of one token onto the signature of the other.
    let mut parts: Vec<&str> = token.split('.').collect();
    let other_parts: Vec<&str> = other.split('.').collect();
    parts[1] = other_parts[1];
    let spliced = parts.join(".");

    assert!(signer.verify(&spliced).is_err());
}

#[test]
fn test_verification_has_no_side_effects() {
    let signer = SessionSigner::new(SECRET);
    let token = signer.issue(&claims(None)).unwrap();
    let first = signer.verify(&token).unwrap();
    let second = signer.verify(&token).unwrap();
    assert_eq!(first, second);
}
