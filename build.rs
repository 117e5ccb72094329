fn main() {
    println!("cargo:rerun-if-env-changed=SLOTLOGGER_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=SLOTLOGGER_WIFI_PASSWORD");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
