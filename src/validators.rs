use crate::error::ValidationFailed;

pub struct Validator<'a, T: ?Sized>(&'a [(&'static str, &'a (dyn Fn(&T) -> bool + Sync))]);

impl<'a, T: ?Sized> Validator<'a, T> {
    pub fn run<U: AsRef<T>>(&self, value: U) -> Result<(), ValidationFailed> {
        let Validator(sub_validators) = *self;
        for (message, validator) in sub_validators {
            if !validator(value.as_ref()) {
                return Err(ValidationFailed(message));
            }
        }
        Ok(())
    }
}

macro_rules! min {
    ($n: expr) => {
        |s| s.len() >= $n
    };
}

macro_rules! max {
    ($n: expr) => {
        |s| s.len() <= $n
    };
}

macro_rules! is_match {
    ($pattern: expr) => {
        |s| regex!($pattern).is_match(&*s)
    };
}

pub static USERNAME: Validator<str> = Validator(&[
    ("Username length shall not be less than 3.", &min!(3)),
    ("Username length shall not be more than 32.", &max!(32)),
    (
        r#"Username can only contain letters, "_" and numbers."#,
        &is_match!(r#"^[\w_\d]+$"#),
    ),
]);

pub static ROOM_TITLE: Validator<str> = Validator(&[
    ("Room title shall not be empty.", &min!(1)),
    ("Room title shall not be more than 32.", &max!(32)),
]);

pub static ATTACHMENT: Validator<str> = Validator(&[
    ("Attachment filename shall not be empty.", &min!(1)),
    ("Attachment filename shall not be more than 254.", &max!(254)),
]);

#[test]
fn validator_test() {
    assert!(USERNAME.run("whoa").is_ok());
    assert!(USERNAME.run("whoa whoa").is_err());
    assert!(USERNAME.run("").is_err());

    assert!(ROOM_TITLE.run("General").is_ok());
    assert!(ROOM_TITLE.run("").is_err());
    assert!(ROOM_TITLE.run("x".repeat(33)).is_err());

    assert!(ATTACHMENT.run("cat.png").is_ok());
    assert!(ATTACHMENT.run("").is_err());
}
