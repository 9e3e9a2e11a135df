fn main() {
    let schema = jsonschema_form_config::schema();
    let json = serde_json::to_string_pretty(&schema).expect("schema serialization");
    println!("{json}");
}
