//! Declarative validation rules.
//!
//! A [`RuleSet`] holds the named rules registered for one request type. Each
//! failing rule yields exactly one `Validation` error, taken from the rule's
//! template; rules guarded by [`Rule::when`] are skipped when the guard is
//! false. A template that is not a well-formed `Validation` error is a
//! programming mistake and surfaces as [`Fault::MalformedRule`].

use crate::domain::{Error, ErrorKind, Fault};

type Check<R> = Box<dyn Fn(&R) -> bool + Send + Sync>;

/// A named predicate over a request and the error reported when it fails.
pub struct Rule<R> {
    name: &'static str,
    error: Error,
    check: Check<R>,
    guard: Option<Check<R>>,
}

impl<R> Rule<R> {
    /// `check` returns `true` when the request satisfies the rule.
    pub fn new(
        name: &'static str,
        error: Error,
        check: impl Fn(&R) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            error,
            check: Box::new(check),
            guard: None,
        }
    }

    /// Only evaluate the rule when `condition` holds.
    #[must_use]
    pub fn when(mut self, condition: impl Fn(&R) -> bool + Send + Sync + 'static) -> Self {
        self.guard = Some(Box::new(condition));
        self
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    fn evaluate(&self, request: &R) -> Result<Option<Error>, Fault> {
        if self.error.kind() != ErrorKind::Validation {
            return Err(Fault::MalformedRule {
                rule: self.name,
                reason: format!("error kind is {}, expected Validation", self.error.kind()),
            });
        }
        self.error.check().map_err(|err| Fault::MalformedRule {
            rule: self.name,
            reason: err.to_string(),
        })?;

        if self.guard.as_ref().is_some_and(|guard| !guard(request)) {
            return Ok(None);
        }
        Ok((!(self.check)(request)).then(|| self.error.clone()))
    }
}

/// Ordered rules for one request type.
pub struct RuleSet<R> {
    rules: Vec<Rule<R>>,
}

impl<R> RuleSet<R> {
    pub const fn new() -> Self {
        Self { rules: Vec::new() }
    }

    #[must_use]
    pub fn with(mut self, rule: Rule<R>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Evaluate every rule and collect the failures in rule order.
    ///
    /// # Errors
    /// Returns [`Fault::MalformedRule`] for a rule with an unusable template.
    pub fn validate(&self, request: &R) -> Result<Vec<Error>, Fault> {
        let mut failures = Vec::new();
        for rule in &self.rules {
            if let Some(error) = rule.evaluate(request)? {
                failures.push(error);
            }
        }
        Ok(failures)
    }
}

impl<R> Default for RuleSet<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[derive(Debug)]
    struct Signup {
        name: String,
        email: String,
    }

    fn signup(name: &str, email: &str) -> Signup {
        Signup {
            name: name.to_owned(),
            email: email.to_owned(),
        }
    }

    fn rules() -> RuleSet<Signup> {
        RuleSet::new()
            .with(Rule::new(
                "name_required",
                Error::validation("Signup.NameEmpty", "Name is required."),
                |s: &Signup| !s.name.is_empty(),
            ))
            .with(Rule::new(
                "email_required",
                Error::validation("Signup.EmailEmpty", "Email is required."),
                |s: &Signup| !s.email.is_empty(),
            ))
            .with(
                Rule::new(
                    "email_shape",
                    Error::validation("Signup.EmailInvalid", "Email is invalid."),
                    |s: &Signup| s.email.contains('@'),
                )
                .when(|s: &Signup| !s.email.is_empty()),
            )
    }

    #[rstest]
    fn passing_request_yields_no_errors() {
        let failures = rules().validate(&signup("Ada", "ada@example.com")).expect("rules are valid");
        assert!(failures.is_empty());
    }

    #[rstest]
    fn each_failing_rule_yields_one_error_in_order() {
        let failures = rules().validate(&signup("", "")).expect("rules are valid");
        let codes: Vec<_> = failures.iter().map(Error::code).collect();
        assert_eq!(codes, vec!["Signup.NameEmpty", "Signup.EmailEmpty"]);
    }

    #[rstest]
    fn guarded_rule_runs_when_condition_holds() {
        let failures = rules().validate(&signup("Ada", "nope")).expect("rules are valid");
        let codes: Vec<_> = failures.iter().map(Error::code).collect();
        assert_eq!(codes, vec!["Signup.EmailInvalid"]);
    }

    #[rstest]
    #[case(Error::validation("", "message"))]
    #[case(Error::validation("Code", " "))]
    #[case(Error::conflict("Code", "message"))]
    fn malformed_templates_are_faults(#[case] template: Error) {
        let set = RuleSet::new().with(Rule::new("broken", template, |_: &Signup| true));
        let result = set.validate(&signup("Ada", "ada@example.com"));
        assert!(matches!(result, Err(Fault::MalformedRule { rule: "broken", .. })));
    }
}
