//! Client-side form checks. A form that fails here never reaches the network.

use crate::models::{LoginRequest, Role, SignupRequest};

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
}

impl SignupForm {
    pub fn validate(&self) -> Result<SignupRequest, String> {
        if self.username.trim().is_empty() {
            return Err("Username is required".to_string());
        }
        if self.password != self.confirm_password {
            return Err("Passwords don't match".to_string());
        }
        let request = SignupRequest {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            role: self.role,
        };
        request.validate()?;
        Ok(request)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<LoginRequest, String> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err("Username and password are required".to_string());
        }
        Ok(LoginRequest {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

/// Splits a comma separated invite box into usernames.
pub fn parse_usernames(input: &str) -> Result<Vec<String>, String> {
    let mut names: Vec<String> = Vec::new();
    for name in input.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    if names.is_empty() {
        return Err("Enter at least one username".to_string());
    }
    Ok(names)
}
