//! User registration and role management

use crate::{
    error::{AppError, AppResult},
    models::{
        counsellor::NewCounsellorProfile,
        enums::Role,
        user::{NewUser, RegisterUser, User, UserClaims, UserQuery},
    },
    repository::Repository,
};

use super::email::EmailService;

/// Email domain granting the admin role
pub const ADMIN_EMAIL_DOMAIN: &str = "@mindbridge.admin";

/// Decide the role of a self-registering user.
///
/// An admin-domain address wins, but only when the identity provider vouched
/// for it (`email_verified`). Then professional credentials, then the
/// requested role (only youth or counsellor may be requested).
pub fn assign_role(
    email: &str,
    email_verified: bool,
    is_professional: bool,
    qualifications: Option<&str>,
    requested: Option<Role>,
) -> Role {
    if email_verified && email.trim().to_lowercase().ends_with(ADMIN_EMAIL_DOMAIN) {
        return Role::Admin;
    }
    let has_qualifications = qualifications.map_or(false, |q| !q.trim().is_empty());
    if is_professional || has_qualifications {
        return Role::Counsellor;
    }
    match requested {
        Some(Role::Counsellor) => Role::Counsellor,
        _ => Role::Youth,
    }
}

/// Column headers of the user export
pub const EXPORT_HEADERS: [&str; 6] = ["Name", "Email", "Role", "Status", "Join Date", "Last Updated"];

/// Render users as CSV, one row per user
pub fn users_csv(users: &[User]) -> AppResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(EXPORT_HEADERS)
        .map_err(|e| AppError::Internal(format!("CSV export failed: {}", e)))?;
    for user in users {
        let role = user.role.to_string();
        let status = if user.is_active { "active" } else { "inactive" };
        let joined = user.created_at.format("%Y-%m-%d").to_string();
        let updated = user.updated_at.format("%Y-%m-%d").to_string();
        writer
            .write_record([
                user.display_name.as_str(),
                user.email.as_str(),
                role.as_str(),
                status,
                joined.as_str(),
                updated.as_str(),
            ])
            .map_err(|e| AppError::Internal(format!("CSV export failed: {}", e)))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV export failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV export failed: {}", e)))
}

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    email: EmailService,
}

impl UsersService {
    pub fn new(repository: Repository, email: EmailService) -> Self {
        Self { repository, email }
    }

    /// Create the user record for the authenticated subject
    pub async fn register(&self, claims: &UserClaims, data: RegisterUser) -> AppResult<User> {
        let email_verified = match claims.email {
            Some(ref token_email) if token_email.trim().eq_ignore_ascii_case(data.email.trim()) => true,
            Some(_) => {
                return Err(AppError::Validation(
                    "Email does not match the authenticated identity".to_string(),
                ))
            }
            None => false,
        };

        let qualifications = data
            .qualifications
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());
        let role = assign_role(
            &data.email,
            email_verified,
            data.is_professional,
            qualifications.as_deref(),
            data.role,
        );

        let user = self
            .repository
            .users
            .create(&NewUser {
                id: claims.sub.clone(),
                email: data.email.trim().to_lowercase(),
                display_name: data.display_name.trim().to_string(),
                role,
                age: data.age,
                is_professional: data.is_professional,
                qualifications,
            })
            .await?;

        if user.role == Role::Counsellor {
            self.repository
                .counsellors
                .create_if_missing(&NewCounsellorProfile::for_user(&user))
                .await?;
        }

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");

        let email = self.email.clone();
        let registered = user.clone();
        tokio::spawn(async move {
            if let Err(e) = email
                .send_welcome(&registered.email, &registered.display_name, registered.role)
                .await
            {
                tracing::warn!(user_id = %registered.id, "Welcome email not sent: {}", e);
            }
        });

        Ok(user)
    }

    pub async fn get(&self, id: &str) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Registered and active user behind a token
    pub async fn current(&self, claims: &UserClaims) -> AppResult<User> {
        let user = self
            .repository
            .users
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Authentication("User is not registered".to_string()))?;
        if !user.is_active {
            return Err(AppError::Authorization("Account is disabled".to_string()));
        }
        Ok(user)
    }

    pub async fn list(&self, admin: &User, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        admin.require_admin()?;
        self.repository.users.search(query).await
    }

    /// CSV of every user matching the filters
    pub async fn export_csv(&self, admin: &User, query: &UserQuery) -> AppResult<String> {
        admin.require_admin()?;
        let users = self.repository.users.export(query).await?;
        tracing::info!(exported = users.len(), admin_id = %admin.id, "Users exported");
        users_csv(&users)
    }

    /// Change a user's role; promotion to counsellor creates the profile
    pub async fn update_role(&self, admin: &User, id: &str, role: Role) -> AppResult<User> {
        admin.require_admin()?;
        let user = self.repository.users.update_role(id, role, &admin.id).await?;
        if role == Role::Counsellor {
            self.repository
                .counsellors
                .create_if_missing(&NewCounsellorProfile::for_user(&user))
                .await?;
        }
        tracing::info!(user_id = %id, role = %role, assigned_by = %admin.id, "Role updated");
        Ok(user)
    }

    pub async fn set_active(&self, admin: &User, id: &str, is_active: bool) -> AppResult<User> {
        admin.require_admin()?;
        if admin.id == id && !is_active {
            return Err(AppError::BusinessRule(
                "Administrators cannot deactivate themselves".to_string(),
            ));
        }
        let user = self.repository.users.set_active(id, is_active).await?;
        tracing::info!(user_id = %id, is_active, "User activation changed");
        Ok(user)
    }

    /// Remove a user; refused while they have upcoming sessions unless forced
    pub async fn delete_user(&self, admin: &User, id: &str, force: bool) -> AppResult<()> {
        admin.require_admin()?;
        if admin.id == id {
            return Err(AppError::BusinessRule(
                "Administrators cannot delete themselves".to_string(),
            ));
        }
        let upcoming = self.repository.users.count_upcoming_appointments(id).await?;
        if upcoming > 0 && !force {
            return Err(AppError::BusinessRule(format!(
                "User has {} upcoming appointments. Use force=true to delete anyway.",
                upcoming
            )));
        }
        self.repository.users.delete(id).await?;
        tracing::info!(user_id = %id, admin_id = %admin.id, upcoming, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_admin_domain_wins() {
        assert_eq!(
            assign_role("ops@mindbridge.admin", true, true, Some("MSc"), Some(Role::Youth)),
            Role::Admin
        );
        assert_eq!(assign_role("Ops@MindBridge.Admin", true, false, None, None), Role::Admin);
    }

    #[test]
    fn test_unverified_admin_email_is_not_admin() {
        assert_eq!(assign_role("eve@mindbridge.admin", false, false, None, None), Role::Youth);
        assert_eq!(
            assign_role("eve@mindbridge.admin", false, false, None, Some(Role::Admin)),
            Role::Youth
        );
    }

    #[test]
    fn test_admin_domain_must_match_exactly() {
        assert_eq!(
            assign_role("eve@mindbridge.admin.attacker.net", true, false, None, None),
            Role::Youth
        );
        assert_eq!(
            assign_role("mindbridge.admin@attacker.net", true, false, None, None),
            Role::Youth
        );
    }

    #[test]
    fn test_professional_or_qualified_become_counsellors() {
        assert_eq!(assign_role("a@example.com", true, true, None, None), Role::Counsellor);
        assert_eq!(
            assign_role("a@example.com", true, false, Some("Licensed therapist"), Some(Role::Youth)),
            Role::Counsellor
        );
        assert_eq!(assign_role("a@example.com", true, false, Some("   "), None), Role::Youth);
    }

    fn user(name: &str, email: &str, role: Role, is_active: bool) -> User {
        let joined = chrono::Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        User {
            id: email.to_string(),
            email: email.to_string(),
            display_name: name.to_string(),
            role,
            age: None,
            is_active,
            is_professional: false,
            qualifications: None,
            role_assigned_at: None,
            role_assigned_by: None,
            created_at: joined,
            updated_at: joined + chrono::Duration::days(30),
        }
    }

    #[test]
    fn test_users_csv() {
        let users = [
            user("Sam Lee", "sam@example.com", Role::Youth, true),
            user("Okafor, Dr.", "okafor@example.com", Role::Counsellor, false),
        ];
        let csv = users_csv(&users).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Name,Email,Role,Status,Join Date,Last Updated");
        assert_eq!(lines[1], "Sam Lee,sam@example.com,youth,active,2026-03-14,2026-04-13");
        // commas in a name are quoted
        assert_eq!(
            lines[2],
            "\"Okafor, Dr.\",okafor@example.com,counsellor,inactive,2026-03-14,2026-04-13"
        );
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_users_csv_empty_has_headers() {
        assert_eq!(users_csv(&[]).unwrap(), "Name,Email,Role,Status,Join Date,Last Updated\n");
    }

    #[test]
    fn test_requested_role_is_limited() {
        assert_eq!(assign_role("a@example.com", true, false, None, None), Role::Youth);
        assert_eq!(
            assign_role("a@example.com", true, false, None, Some(Role::Counsellor)),
            Role::Counsellor
        );
        assert_eq!(assign_role("a@example.com", true, false, None, Some(Role::Admin)), Role::Youth);
    }
}
