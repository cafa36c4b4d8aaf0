use core_foundation::base::TCFType;
use core_foundation::boolean::CFBoolean;
use core_foundation::dictionary::CFDictionary;
use core_foundation::string::CFString;
use log::warn;

mod bindings {
    use core_foundation::dictionary::CFDictionaryRef;
    use core_foundation::string::CFStringRef;

    extern "C" {
        pub static kAXTrustedCheckOptionPrompt: CFStringRef;
        pub fn AXIsProcessTrustedWithOptions(options: CFDictionaryRef) -> bool;
    }
}

/// Whether this process may post synthetic keyboard events. With `prompt`, macOS shows its
/// "grant accessibility access" dialog when it may not.
pub fn is_accessibility_trusted(prompt: bool) -> bool {
    unsafe {
        let options: CFDictionary<CFString, CFBoolean> = CFDictionary::from_CFType_pairs(&[(
            CFString::wrap_under_get_rule(bindings::kAXTrustedCheckOptionPrompt),
            CFBoolean::from(prompt),
        )]);

        bindings::AXIsProcessTrustedWithOptions(options.as_concrete_TypeRef())
    }
}

pub fn warn_if_untrusted() {
    if !is_accessibility_trusted(true) {
        warn!(
            "Typing distances requires \"accessibility\" access, which this application does not have. \
            Open \"System Settings\", navigate to \"Privacy & Security\", then \"Accessibility\", \
            add a checkmark next to your terminal (or disto-keyboard) and restart the application."
        );
    }
}
