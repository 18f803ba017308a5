use calmform::form::{FieldValue, FormController, FormModel};

#[derive(Clone, calmform::form::FormModel)]
struct DemoForm {
    email: String,
    age: rust_decimal::Decimal,
    subscribed: bool,
}

fn main() {
    let fields = DemoForm::fields();
    assert_eq!(fields.email().as_str(), "email");

    let mut form = FormController::from_model(DemoForm {
        email: "a@calm.form".to_string(),
        age: rust_decimal::Decimal::from(30),
        subscribed: false,
    })
    .expect("unique fields");
    form.set_value(fields.email(), "b@calm.form").expect("text field");
    assert_eq!(
        form.value(fields.subscribed()).expect("flag field"),
        &FieldValue::Flag(false)
    );

    let model: DemoForm = form.values_as().expect("typed values");
    assert_eq!(model.email, "b@calm.form");
    assert_eq!(model.age, rust_decimal::Decimal::from(30));
    assert!(!model.subscribed);
}
