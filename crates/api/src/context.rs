use adminkit_auth::Subject;

/// Per-request acting subject, resolved by the auth middleware from the
/// bearer token and the directory. Handlers receive it as an extension and
/// pass it to the service explicitly.
#[derive(Clone)]
pub struct SubjectContext {
    subject: Subject,
}

impl SubjectContext {
    pub fn new(subject: Subject) -> Self {
        Self { subject }
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }
}
