fn main() {
    // Only the firmware build needs the ESP-IDF environment; host tests
    // run with `--no-default-features` and skip it.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
