fn main() {
    // ESP-IDF link arguments and environment. Host builds have nothing to
    // generate.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
