fn main() {
    // ESP-IDF link args are only needed for the firmware build.
    #[cfg(feature = "esp")]
    embuild::espidf::sysenv::output();
}
