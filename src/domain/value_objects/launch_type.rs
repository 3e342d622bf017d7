//! Launch type value object

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Execution environment class for tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LaunchType {
    /// Managed hosts
    #[default]
    Ec2,
    /// Serverless; needs awsvpc network configuration
    Fargate,
}

impl LaunchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LaunchType::Ec2 => "EC2",
            LaunchType::Fargate => "FARGATE",
        }
    }

    /// Whether tasks of this type need subnets and security groups.
    pub fn requires_network_configuration(&self) -> bool {
        matches!(self, LaunchType::Fargate)
    }
}

impl fmt::Display for LaunchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LaunchType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EC2" => Ok(LaunchType::Ec2),
            "FARGATE" => Ok(LaunchType::Fargate),
            _ => Err(ValidationError::InvalidLaunchType {
                value: s.to_string(),
            }),
        }
    }
}
