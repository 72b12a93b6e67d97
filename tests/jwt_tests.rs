use mekanix_backend::config::JwtConfig;
use mekanix_backend::util::jwt::*;

// Helper function to create JWT utils for testing
fn create_test_jwt_utils() -> JwtTokenUtilsImpl {
    // Try to load from test environment variables first, fall back to default config
    JwtTokenUtilsImpl::from_test_env().unwrap_or_else(|_| {
        // If env vars are not available, use default config
        let config = JwtConfig::default();
        JwtTokenUtilsImpl::new(config)
    })
}

// Test user data
struct TestUser {
    id: String,
    role: String,
}

impl TestUser {
    fn new_customer() -> Self {
        Self {
            id: "65f1a2b3c4d5e6f7a8b9c0d1".to_string(),
            role: "customer".to_string(),
        }
    }

    fn new_technician() -> Self {
        Self {
            id: "65f1a2b3c4d5e6f7a8b9c0d2".to_string(),
            role: "technician".to_string(),
        }
    }
}

#[test]
fn test_jwt_utils_creation() {
    let jwt_utils = create_test_jwt_utils();
    assert!(!jwt_utils.jwt_config.jwt_secret.is_empty());
    assert!(jwt_utils.jwt_config.access_token_expiration > 0);
}

#[test]
fn test_generate_access_token_success() {
    let jwt_utils = create_test_jwt_utils();
    let user = TestUser::new_customer();

    let result = jwt_utils.generate_access_token(&user.id, &user.role);
    assert!(result.is_ok());

    let token = result.unwrap();
    assert!(!token.is_empty());

    // Verify the token can be validated
    let claims_result = jwt_utils.validate_access_token(&token);
    assert!(claims_result.is_ok());

    let claims = claims_result.unwrap();
    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.role, user.role);
    assert!(claims.exp > claims.iat);
    assert!(!claims.jti.is_empty());
}

#[test]
fn test_tokens_are_unique() {
    let jwt_utils = create_test_jwt_utils();
    let user = TestUser::new_technician();

    let first = jwt_utils.generate_access_token(&user.id, &user.role).unwrap();
    let second = jwt_utils.generate_access_token(&user.id, &user.role).unwrap();
    // jti differs even for identical subject and role
    assert_ne!(first, second);
}

#[test]
fn test_validate_tampered_token_fails() {
    let jwt_utils = create_test_jwt_utils();
    let user = TestUser::new_customer();

    let mut token = jwt_utils.generate_access_token(&user.id, &user.role).unwrap();
    token.push('x');

    assert!(jwt_utils.validate_access_token(&token).is_err());
}

#[test]
fn test_validate_token_with_wrong_secret_fails() {
    let jwt_utils = create_test_jwt_utils();
    let user = TestUser::new_customer();
    let token = jwt_utils.generate_access_token(&user.id, &user.role).unwrap();

    let other = JwtTokenUtilsImpl::new(JwtConfig {
        jwt_secret: "a_completely_different_secret_that_is_long_enough_to_pass".to_string(),
        ..JwtConfig::default()
    });
    assert!(other.validate_access_token(&token).is_err());
}

#[test]
fn test_validate_garbage_token_fails() {
    let jwt_utils = create_test_jwt_utils();
    assert!(jwt_utils.validate_access_token("not.a.token").is_err());
    assert!(jwt_utils.validate_access_token("").is_err());
}

#[test]
fn test_extract_token_from_header() {
    let jwt_utils = create_test_jwt_utils();

    let token = jwt_utils.extract_token_from_header("Bearer abc123").unwrap();
    assert_eq!(token, "abc123");

    assert!(matches!(
        jwt_utils.extract_token_from_header("abc123"),
        Err(JwtError::InvalidToken)
    ));
    assert!(matches!(
        jwt_utils.extract_token_from_header("Basic abc123"),
        Err(JwtError::InvalidToken)
    ));
    assert!(matches!(
        jwt_utils.extract_token_from_header("Bearer "),
        Err(JwtError::InvalidToken)
    ));
}

#[test]
fn test_check_role_permission() {
    let jwt_utils = create_test_jwt_utils();

    assert!(jwt_utils.check_role_permission("customer", "customer"));
    assert!(jwt_utils.check_role_permission("technician", "technician"));

    // Admin has access to every route group
    assert!(jwt_utils.check_role_permission("admin", "customer"));
    assert!(jwt_utils.check_role_permission("admin", "technician"));

    assert!(!jwt_utils.check_role_permission("customer", "technician"));
    assert!(!jwt_utils.check_role_permission("technician", "customer"));
    assert!(!jwt_utils.check_role_permission("supplier", "customer"));
}
