//! ARM request and response bodies for container groups.

use flotilla_core::ResourceGroup;
use flotilla_model::{ContainerGroupSpec, OsType, ResourceStatus, RestartPolicy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ContainerGroupBody<'a> {
    pub location: &'a str,
    pub properties: ContainerGroupProperties<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ContainerGroupProperties<'a> {
    pub containers: Vec<Container<'a>>,
    pub os_type: &'static str,
    pub restart_policy: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Container<'a> {
    pub name: &'a str,
    pub properties: ContainerProperties<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ContainerProperties<'a> {
    pub image: &'a str,
    pub command: &'a [String],
    pub environment_variables: Vec<EnvironmentVariable<'a>>,
    pub resources: Resources,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EnvironmentVariable<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure_value: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Resources {
    pub requests: ResourceRequests,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResourceRequests {
    pub cpu: f64,
    #[serde(rename = "memoryInGB")]
    pub memory_in_gb: f64,
}

impl<'a> ContainerGroupBody<'a> {
    pub fn new(group: &'a ResourceGroup, spec: &'a ContainerGroupSpec) -> Self {
        let environment_variables = spec
            .env
            .iter()
            .map(|var| {
                if var.is_secure() {
                    EnvironmentVariable {
                        name: var.name(),
                        value: None,
                        secure_value: Some(var.value()),
                    }
                } else {
                    EnvironmentVariable {
                        name: var.name(),
                        value: Some(var.value()),
                        secure_value: None,
                    }
                }
            })
            .collect();

        Self {
            location: &group.location,
            properties: ContainerGroupProperties {
                containers: vec![Container {
                    name: &spec.container_name,
                    properties: ContainerProperties {
                        image: &spec.image,
                        command: &spec.command,
                        environment_variables,
                        resources: Resources {
                            requests: ResourceRequests {
                                cpu: spec.limits.cpu,
                                memory_in_gb: spec.limits.memory_in_gb,
                            },
                        },
                    },
                }],
                os_type: os_type(spec.os_type),
                restart_policy: restart_policy(spec.restart_policy),
            },
        }
    }
}

fn os_type(os: OsType) -> &'static str {
    match os {
        OsType::Linux => "Linux",
        OsType::Windows => "Windows",
    }
}

fn restart_policy(policy: RestartPolicy) -> &'static str {
    match policy {
        RestartPolicy::Always => "Always",
        RestartPolicy::OnFailure => "OnFailure",
        RestartPolicy::Never => "Never",
    }
}

/// The subset of a container group GET response the poller needs.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ContainerGroupView {
    #[serde(default)]
    pub properties: ViewProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ViewProperties {
    #[serde(default)]
    pub containers: Vec<ContainerView>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ContainerView {
    #[serde(default)]
    pub properties: ContainerViewProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ContainerViewProperties {
    pub instance_view: Option<InstanceView>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InstanceView {
    pub current_state: Option<ContainerState>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ContainerState {
    pub state: Option<String>,
}

impl ContainerGroupView {
    /// Status of the first container; a group without an instance view is still pending.
    pub fn status(&self) -> ResourceStatus {
        let state = self
            .properties
            .containers
            .first()
            .and_then(|c| c.properties.instance_view.as_ref())
            .and_then(|v| v.current_state.as_ref())
            .and_then(|s| s.state.as_deref());
        ResourceStatus::from_state(state)
    }
}

/// Body of an `Azure-AsyncOperation` status resource.
#[derive(Debug, Deserialize)]
pub(crate) struct OperationStatus {
    pub status: String,
    #[serde(default)]
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResourceGroupView {
    pub name: String,
    pub location: String,
}

#[cfg(test)]
mod tests {
    use flotilla_model::{EnvVar, ResourceLimits, RunnerEnv, RunnerSpec};
    use serde_json::json;

    use super::*;

    fn spec() -> ContainerGroupSpec {
        let mut env = RunnerEnv::new();
        env.push(EnvVar::plain("RUNNER_ID", "3"));
        env.push(EnvVar::secure("DB_URL", "postgres://u:p@db/x"));
        let runner = RunnerSpec {
            resource_name: "flotilla-runner-b1-3".into(),
            command: vec!["/bin/sh".into(), "-c".into(), "true".into()],
            env,
        };
        ContainerGroupSpec::for_runner("c", "img:1", ResourceLimits::default(), &runner)
    }

    #[test]
    fn create_body_matches_arm_shape() {
        let group = ResourceGroup::new("rg", "westeurope");
        let spec = spec();
        let body = serde_json::to_value(ContainerGroupBody::new(&group, &spec)).unwrap();

        assert_eq!(
            body,
            json!({
                "location": "westeurope",
                "properties": {
                    "containers": [{
                        "name": "c",
                        "properties": {
                            "image": "img:1",
                            "command": ["/bin/sh", "-c", "true"],
                            "environmentVariables": [
                                {"name": "RUNNER_ID", "value": "3"},
                                {"name": "DB_URL", "secureValue": "postgres://u:p@db/x"}
                            ],
                            "resources": {"requests": {"cpu": 1.0, "memoryInGB": 1.5}}
                        }
                    }],
                    "osType": "Linux",
                    "restartPolicy": "Never"
                }
            })
        );
    }

    #[test]
    fn view_without_instance_view_is_pending() {
        let view: ContainerGroupView = serde_json::from_value(json!({
            "name": "x",
            "properties": {"containers": [{"name": "c", "properties": {}}]}
        }))
        .unwrap();
        assert_eq!(view.status(), ResourceStatus::Pending);
    }

    #[test]
    fn view_reads_first_container_state() {
        let view: ContainerGroupView = serde_json::from_value(json!({
            "properties": {"containers": [{"properties": {
                "instanceView": {"currentState": {"state": "Terminated", "exitCode": 0}}
            }}]}
        }))
        .unwrap();
        assert!(view.status().is_terminated());
    }
}
