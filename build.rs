fn main() {
    // Host builds (tests, fuzzing) have nothing to link against ESP-IDF.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
