pub mod application;
pub mod audit_log;
pub mod authorization_request;
pub mod consent;
pub mod email_verification_code;
pub mod oauth_token;
pub mod role;
pub mod session;
pub mod user;

pub use application::ApplicationRepository;
pub use audit_log::AuditLogRepository;
pub use authorization_request::AuthorizationRequestRepository;
pub use consent::ConsentRepository;
pub use email_verification_code::EmailVerificationCodeRepository;
pub use oauth_token::OauthTokenRepository;
pub use role::RoleRepository;
pub use session::SessionRepository;
pub use user::UserRepository;
