use serde::{Deserialize, Serialize};

/// Static identity of a checker, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerIdentity {
    /// Name of the service this checker is responsible for.
    pub service_name: String,
    /// Port the checker HTTP endpoint listens on.
    pub checker_port: u16,
    /// Distinct flag variants per round.
    pub flag_variants: u64,
    /// Distinct noise variants per round.
    pub noise_variants: u64,
    /// Havoc variants per round.
    pub havoc_variants: u64,
}

impl CheckerIdentity {
    pub fn new(service_name: impl Into<String>, checker_port: u16) -> Self {
        Self {
            service_name: service_name.into(),
            checker_port,
            flag_variants: 1,
            noise_variants: 1,
            havoc_variants: 1,
        }
    }

    pub fn with_variants(mut self, flags: u64, noises: u64, havocs: u64) -> Self {
        self.flag_variants = flags;
        self.noise_variants = noises;
        self.havoc_variants = havocs;
        self
    }

    /// Tool name reported in log records, e.g. `"ExampleServiceChecker"`.
    pub fn checker_name(&self) -> String {
        format!("{}Checker", self.service_name)
    }

    /// Capability descriptor served on `GET /`.
    pub fn info(&self) -> CheckerInfoMessage {
        CheckerInfoMessage {
            service_name: self.service_name.clone(),
            flag_variants: self.flag_variants,
            noise_variants: self.noise_variants,
            havoc_variants: self.havoc_variants,
        }
    }
}

/// Capability descriptor of a checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckerInfoMessage {
    pub service_name: String,
    pub flag_variants: u64,
    pub noise_variants: u64,
    pub havoc_variants: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checker_name_appends_suffix() {
        let id = CheckerIdentity::new("Echo", 8000);
        assert_eq!(id.checker_name(), "EchoChecker");
    }

    #[test]
    fn info_reflects_identity() {
        let id = CheckerIdentity::new("Echo", 8000).with_variants(3, 2, 5);
        let json = serde_json::to_value(id.info()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "serviceName": "Echo",
                "flagVariants": 3,
                "noiseVariants": 2,
                "havocVariants": 5
            })
        );
    }
}
