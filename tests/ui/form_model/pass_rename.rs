use calmform::prelude::*;

#[derive(FormModel)]
struct Credentials {
    password: String,
    #[form(rename = "passwordAgain")]
    password_again: String,
}

fn main() {
    assert_eq!(Credentials::fields().password_again().as_str(), "passwordAgain");

    let form = FormController::from_model(Credentials {
        password: String::new(),
        password_again: String::new(),
    })
    .expect("unique fields");
    assert!(form.field("passwordAgain").is_ok());
    assert!(form.field("password_again").is_err());
}
