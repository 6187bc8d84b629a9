use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use super::dto::{AdminSignup, EmployerSignup, LoginRequest, StudentSignup};
use crate::{
    error::{AppError, FieldErrors},
    users::model::{AdminProfile, EmployerProfile, Profile, Role, StudentProfile},
};

const ROLE_MESSAGE: &str = "Role must be one of student, employer, admin";

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[1-9]\d{0,15}$").unwrap();
    static ref URL_RE: Regex = Regex::new(r"^https?://[^\s/$.?#][^\s]*$").unwrap();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validated signup, ready to hash and persist.
#[derive(Debug)]
pub struct SignupData {
    pub email: String,
    pub password: String,
    pub avatar_url: Option<String>,
    pub profile: Profile,
}

fn len(s: &str) -> usize {
    s.trim().chars().count()
}

/// Blank optional strings count as absent.
fn opt(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn min_len(errors: &mut FieldErrors, field: &str, value: &str, min: usize, label: &str) {
    if min <= 1 && len(value) == 0 {
        errors.add(field, format!("{label} is required"));
    } else if len(value) < min {
        errors.add(field, format!("{label} must be at least {min} characters"));
    }
}

fn check_email(errors: &mut FieldErrors, email: &str) -> String {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        errors.add("email", "Invalid email address");
    }
    email
}

fn check_strong_password(errors: &mut FieldErrors, password: &str) {
    if password.chars().count() < 8 {
        errors.add("password", "Password must be at least 8 characters");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.add("password", "Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.add("password", "Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.add("password", "Password must contain at least one number");
    }
    if !password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        errors.add("password", "Password must contain at least one special character");
    }
}

fn validate_student(s: StudentSignup, mut errors: FieldErrors) -> Result<SignupData, AppError> {
    let email = check_email(&mut errors, &s.email);
    check_strong_password(&mut errors, &s.password);
    min_len(&mut errors, "firstName", &s.first_name, 2, "First name");
    min_len(&mut errors, "lastName", &s.last_name, 2, "Last name");
    min_len(&mut errors, "education", &s.education, 1, "Education");
    min_len(&mut errors, "location", &s.location, 1, "Location");

    let skills: Vec<String> = s
        .skills
        .iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    if skills.is_empty() {
        errors.add("skills", "At least one skill is required");
    }

    let phone_number = opt(s.phone_number);
    if let Some(phone) = &phone_number {
        if !PHONE_RE.is_match(phone) {
            errors.add("phoneNumber", "Please enter a valid phone number");
        }
    }
    errors.into_result()?;

    Ok(SignupData {
        email,
        password: s.password,
        avatar_url: opt(s.image),
        profile: Profile::Student(StudentProfile {
            first_name: s.first_name.trim().to_string(),
            last_name: s.last_name.trim().to_string(),
            education: s.education.trim().to_string(),
            skills,
            experience: opt(s.experience),
            phone_number,
            location: s.location.trim().to_string(),
        }),
    })
}

fn validate_employer(e: EmployerSignup, mut errors: FieldErrors) -> Result<SignupData, AppError> {
    let email = check_email(&mut errors, &e.email);
    check_strong_password(&mut errors, &e.password);
    min_len(&mut errors, "companyName", &e.company_name, 2, "Company name");
    min_len(&mut errors, "location", &e.location, 1, "Location");
    min_len(&mut errors, "description", &e.description, 10, "Description");

    let website = opt(e.website);
    if let Some(url) = &website {
        if !URL_RE.is_match(url) {
            errors.add("website", "Invalid website URL");
        }
    }
    errors.into_result()?;

    Ok(SignupData {
        email,
        password: e.password,
        avatar_url: opt(e.image),
        profile: Profile::Employer(EmployerProfile {
            company_name: e.company_name.trim().to_string(),
            location: e.location.trim().to_string(),
            industry: opt(e.industry),
            website,
            description: opt(Some(e.description)),
        }),
    })
}

fn validate_admin(a: AdminSignup, mut errors: FieldErrors) -> Result<SignupData, AppError> {
    let email = check_email(&mut errors, &a.email);
    if a.password.chars().count() < 6 {
        errors.add("password", "Password must be at least 6 characters");
    }
    min_len(&mut errors, "name", &a.name, 1, "Name");
    errors.into_result()?;

    Ok(SignupData {
        email,
        password: a.password,
        avatar_url: opt(a.image),
        profile: Profile::Admin(AdminProfile {
            name: a.name.trim().to_string(),
        }),
    })
}

/// Reads fields out of a raw JSON object. Absent and `null` values read as
/// empty; a value of the wrong type is recorded under its own field name.
struct RawBody<'a> {
    map: &'a Map<String, Value>,
    errors: FieldErrors,
}

impl<'a> RawBody<'a> {
    fn new(map: &'a Map<String, Value>) -> Self {
        Self {
            map,
            errors: FieldErrors::new(),
        }
    }

    fn opt_string(&mut self, field: &str) -> Option<String> {
        match self.map.get(field) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.errors.add(field, "Must be a string");
                None
            }
        }
    }

    fn string(&mut self, field: &str) -> String {
        self.opt_string(field).unwrap_or_default()
    }

    fn string_list(&mut self, field: &str) -> Vec<String> {
        match self.map.get(field) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => {
                let strings: Vec<String> = items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect();
                if strings.len() != items.len() {
                    self.errors.add(field, "Must be a list of strings");
                }
                strings
            }
            Some(_) => {
                self.errors.add(field, "Must be a list of strings");
                Vec::new()
            }
        }
    }

    fn role(&mut self) -> Option<Role> {
        let role = self
            .map
            .get("role")
            .and_then(Value::as_str)
            .and_then(|r| r.parse::<Role>().ok());
        if role.is_none() {
            self.errors.add("role", ROLE_MESSAGE);
        }
        role
    }

    fn student(&mut self) -> StudentSignup {
        StudentSignup {
            email: self.string("email"),
            password: self.string("password"),
            first_name: self.string("firstName"),
            last_name: self.string("lastName"),
            education: self.string("education"),
            skills: self.string_list("skills"),
            experience: self.opt_string("experience"),
            phone_number: self.opt_string("phoneNumber"),
            location: self.string("location"),
            image: self.opt_string("image"),
        }
    }

    fn employer(&mut self) -> EmployerSignup {
        EmployerSignup {
            email: self.string("email"),
            password: self.string("password"),
            company_name: self.string("companyName"),
            location: self.string("location"),
            industry: self.opt_string("industry"),
            website: self.opt_string("website"),
            description: self.string("description"),
            image: self.opt_string("image"),
        }
    }

    fn admin(&mut self) -> AdminSignup {
        AdminSignup {
            email: self.string("email"),
            password: self.string("password"),
            name: self.string("name"),
            image: self.opt_string("image"),
        }
    }
}

/// Validates a raw signup body: the role discriminator, then every field
/// rule of that role, collecting all failures into one error.
pub fn validate_signup(body: Value) -> Result<SignupData, AppError> {
    let Value::Object(map) = &body else {
        return Err(AppError::invalid("body", "Expected a JSON object"));
    };
    let mut raw = RawBody::new(map);
    match raw.role() {
        Some(Role::Student) => {
            let s = raw.student();
            validate_student(s, raw.errors)
        }
        Some(Role::Employer) => {
            let e = raw.employer();
            validate_employer(e, raw.errors)
        }
        Some(Role::Admin) => {
            let a = raw.admin();
            validate_admin(a, raw.errors)
        }
        None => {
            let email = raw.string("email");
            let mut errors = raw.errors;
            check_email(&mut errors, &email);
            Err(AppError::Validation(errors))
        }
    }
}

pub fn validate_login(mut req: LoginRequest) -> Result<LoginRequest, AppError> {
    let mut errors = FieldErrors::new();
    req.email = check_email(&mut errors, &req.email);
    if req.password.chars().count() < 6 {
        errors.add("password", "Password must be at least 6 characters");
    }
    errors.into_result()?;
    Ok(req)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field_errors(err: AppError) -> FieldErrors {
        match err {
            AppError::Validation(f) => f,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    fn employer_body() -> serde_json::Value {
        json!({
            "role": "employer",
            "email": "E@X.com ",
            "password": "Abcd1234!",
            "companyName": "Acme",
            "location": "Berlin",
            "description": "We hire interns every summer.",
            "website": ""
        })
    }

    #[test]
    fn valid_employer_is_normalized() {
        let data = validate_signup(employer_body()).unwrap();
        assert_eq!(data.email, "e@x.com");
        match data.profile {
            Profile::Employer(e) => {
                assert_eq!(e.company_name, "Acme");
                assert_eq!(e.website, None);
            }
            other => panic!("unexpected profile {other:?}"),
        }
    }

    #[test]
    fn every_failing_field_is_reported() {
        let err = validate_signup(json!({
            "role": "student",
            "email": "nope",
            "password": "short",
            "firstName": "A",
            "skills": ["  "],
            "phoneNumber": "0123"
        }))
        .unwrap_err();
        let fields = field_errors(err);
        for f in [
            "email",
            "password",
            "firstName",
            "lastName",
            "education",
            "location",
            "skills",
            "phoneNumber",
        ] {
            assert!(fields.contains(f), "missing error for {f}");
        }
    }

    #[test]
    fn password_rules_report_each_missing_class() {
        let mut body = employer_body();
        body["password"] = json!("abcdefgh");
        let fields = field_errors(validate_signup(body).unwrap_err());
        assert_eq!(fields.fields().collect::<Vec<_>>(), vec!["password"]);

        let mut body = employer_body();
        body["password"] = json!("Abcdefg1");
        assert!(validate_signup(body).is_err(), "special character required");
    }

    #[test]
    fn unknown_or_missing_role_is_a_role_error() {
        for body in [json!({ "role": "superuser" }), json!({ "email": "a@b.co" })] {
            let fields = field_errors(validate_signup(body).unwrap_err());
            assert!(fields.contains("role"));
        }

        let fields = field_errors(validate_signup(json!({ "role": 7, "email": "x" })).unwrap_err());
        assert!(fields.contains("role"));
        assert!(fields.contains("email"));
    }

    #[test]
    fn wrong_typed_fields_do_not_hide_other_errors() {
        let err = validate_signup(json!({
            "role": "student",
            "email": "nope",
            "password": "short",
            "firstName": null,
            "lastName": 42,
            "education": "BSc",
            "skills": "Rust",
            "location": "London"
        }))
        .unwrap_err();
        let fields = field_errors(err);
        for f in ["email", "password", "firstName", "lastName", "skills"] {
            assert!(fields.contains(f), "missing error for {f}");
        }
        assert!(!fields.contains("body"));
        assert!(!fields.contains("education"));
    }

    #[test]
    fn non_object_body_is_rejected() {
        let fields = field_errors(validate_signup(json!(["student"])).unwrap_err());
        assert!(fields.contains("body"));
    }

    #[test]
    fn admin_accepts_short_password_and_name_only() {
        let data = validate_signup(json!({
            "role": "admin",
            "email": "root@school.edu",
            "password": "secret",
            "name": "Registrar"
        }))
        .unwrap();
        assert!(matches!(data.profile, Profile::Admin(_)));
    }

    #[test]
    fn website_must_be_a_url() {
        let mut body = employer_body();
        body["website"] = json!("acme dot com");
        let fields = field_errors(validate_signup(body).unwrap_err());
        assert!(fields.contains("website"));
    }

    #[test]
    fn login_normalizes_email_and_checks_length() {
        let ok = validate_login(LoginRequest {
            email: " Foo@Example.COM".into(),
            password: "123456".into(),
        })
        .unwrap();
        assert_eq!(ok.email, "foo@example.com");

        assert!(validate_login(LoginRequest {
            email: "foo@example.com".into(),
            password: "12345".into(),
        })
        .is_err());
    }
}
