//! Automation-fingerprint masking for the render tier.

use rand::Rng;

use crate::config::DESKTOP_CHROME_USER_AGENT;

/// Common desktop viewport sizes; one is picked per session.
const VIEWPORTS: &[(u32, u32)] = &[(1920, 1080), (1366, 768), (1536, 864), (1440, 900)];
const HARDWARE_CONCURRENCY: &[u32] = &[4, 8, 12, 16];

/// Per-session browser fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SessionFingerprint {
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub hardware_concurrency: u32,
    pub user_agent: &'static str,
}

impl SessionFingerprint {
    pub(crate) fn randomized() -> Self {
        let mut rng = rand::rng();
        let (viewport_width, viewport_height) = VIEWPORTS[rng.random_range(0..VIEWPORTS.len())];
        let hardware_concurrency =
            HARDWARE_CONCURRENCY[rng.random_range(0..HARDWARE_CONCURRENCY.len())];
        Self {
            viewport_width,
            viewport_height,
            hardware_concurrency,
            user_agent: DESKTOP_CHROME_USER_AGENT,
        }
    }

    /// Extra Chrome command-line switches for this fingerprint.
    pub(crate) fn launch_args(&self) -> Vec<String> {
        vec![
            "--disable-blink-features=AutomationControlled".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-extensions".to_string(),
            "--no-first-run".to_string(),
            "--lang=en-US".to_string(),
            format!("--user-agent={}", self.user_agent),
        ]
    }

    /// Script evaluated in every new document before any page script runs.
    pub(crate) fn init_script(&self) -> String {
        STEALTH_SCRIPT.replace(
            "__HARDWARE_CONCURRENCY__",
            &self.hardware_concurrency.to_string(),
        )
    }
}

const STEALTH_SCRIPT: &str = r#"
(() => {
    const proto = Navigator.prototype;
    const define = (name, value) => {
        try {
            Object.defineProperty(proto, name, { get: () => value, configurable: true });
        } catch (e) {}
    };
    define('webdriver', undefined);
    define('languages', ['en-US', 'en']);
    define('plugins', [1, 2, 3, 4, 5]);
    define('hardwareConcurrency', __HARDWARE_CONCURRENCY__);

    if (!window.chrome) {
        window.chrome = {};
    }
    if (!window.chrome.runtime) {
        window.chrome.runtime = {
            connect: function() { return { onDisconnect: { addListener: function() {} } }; },
            sendMessage: function() {},
        };
    }

    const originalQuery = window.navigator.permissions && window.navigator.permissions.query;
    if (originalQuery) {
        window.navigator.permissions.query = (parameters) => (
            parameters.name === 'notifications'
                ? Promise.resolve({ state: Notification.permission })
                : originalQuery(parameters)
        );
    }

    const patchWebGl = (ctor) => {
        if (typeof ctor === 'undefined') return;
        const getParameter = ctor.prototype.getParameter;
        ctor.prototype.getParameter = function(parameter) {
            if (parameter === 37445) return 'Intel Inc.';
            if (parameter === 37446) return 'Intel Iris OpenGL Engine';
            return getParameter.apply(this, arguments);
        };
    };
    patchWebGl(window.WebGLRenderingContext);
    patchWebGl(window.WebGL2RenderingContext);
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_randomized_fingerprint_uses_known_values() {
        for _ in 0..20 {
            let fp = SessionFingerprint::randomized();
            assert!(VIEWPORTS.contains(&(fp.viewport_width, fp.viewport_height)));
            assert!(HARDWARE_CONCURRENCY.contains(&fp.hardware_concurrency));
        }
    }

    #[test]
    fn test_init_script_is_filled_in() {
        let fp = SessionFingerprint {
            viewport_width: 1366,
            viewport_height: 768,
            hardware_concurrency: 8,
            user_agent: DESKTOP_CHROME_USER_AGENT,
        };
        let script = fp.init_script();
        assert!(script.contains("define('hardwareConcurrency', 8)"));
        assert!(!script.contains("__HARDWARE_CONCURRENCY__"));
        assert!(script.contains("webdriver"));
    }

    #[test]
    fn test_launch_args_hide_automation() {
        let args = SessionFingerprint::randomized().launch_args();
        assert!(args.iter().any(|a| a == "--disable-blink-features=AutomationControlled"));
        assert!(args.iter().any(|a| a.starts_with("--user-agent=Mozilla/5.0")));
    }
}
