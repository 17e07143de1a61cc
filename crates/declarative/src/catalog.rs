//! Built-in adapters for Prisma Cloud resource types

use crate::adapter::{PathTemplate, ResourceAdapter};
use serde_json::json;

/// Every built-in adapter, in display order
pub fn all() -> Vec<ResourceAdapter> {
    vec![
        aws_cloud_account(),
        azure_cloud_account(),
        gcp_cloud_account(),
        alibaba_cloud_account(),
        cloud_account(),
        account_group(),
        compliance_standard(),
        compliance_requirement(),
        compliance_section(),
        policy(),
    ]
}

/// Look up a built-in adapter by kind
pub fn find(kind: &str) -> Option<ResourceAdapter> {
    all().into_iter().find(|a| a.kind == kind)
}

/// Cloud accounts of one provider, listed through `cloud/name?cloudType=..`
fn provider_account(kind: &str, cloud_type: &str) -> ResourceAdapter {
    ResourceAdapter::new(kind, "name")
        .identity_fields(&["name", "id"])
        .list(PathTemplate::literal(&["cloud", "name"]))
        .list_query("cloudType", cloud_type)
        .detail(PathTemplate::literal(&["cloud", cloud_type]).field("id"))
        .object_path(&["cloud", cloud_type])
}

pub fn aws_cloud_account() -> ResourceAdapter {
    provider_account("aws_cloud_account", "aws")
        .description("AWS cloud account onboarded to Prisma Cloud")
        .identity_path("accountId")
        .name_path("name")
        .required_fields(&["enabled", "externalId", "groupIds", "name", "roleArn"])
        .defaults(json!({
            "accountId": "",
            "enabled": false,
            "externalId": "",
            "groupIds": [],
            "name": "",
            "roleArn": "",
        }))
}

pub fn azure_cloud_account() -> ResourceAdapter {
    provider_account("azure_cloud_account", "azure")
        .description("Azure subscription onboarded to Prisma Cloud")
        .identity_path("cloudAccount.accountId")
        .name_path("cloudAccount.name")
        .required_fields(&[
            "cloudAccount",
            "clientId",
            "key",
            "monitorFlowLogs",
            "tenantId",
            "servicePrincipalId",
        ])
        .defaults(json!({
            "cloudAccount": {
                "accountId": "",
                "enabled": false,
                "groupIds": [],
                "name": "",
            },
            "clientId": "",
            "key": "",
            "monitorFlowLogs": false,
            "tenantId": "",
            "servicePrincipalId": "",
        }))
}

pub fn gcp_cloud_account() -> ResourceAdapter {
    provider_account("gcp_cloud_account", "gcp")
        .description("GCP project onboarded to Prisma Cloud")
        .identity_path("cloudAccount.accountId")
        .name_path("cloudAccount.name")
        .required_fields(&[
            "cloudAccount",
            "credentials",
            "compressionEnabled",
            "dataflowEnabledProject",
            "flowLogStorageBucket",
        ])
        .defaults(json!({
            "cloudAccount": {
                "accountId": "",
                "enabled": false,
                "groupIds": [],
                "name": "",
            },
            "compressionEnabled": false,
            "dataflowEnabledProject": "",
            "flowLogStorageBucket": "",
            "credentials": {
                "type": "",
                "project_id": "",
                "private_key_id": "",
                "private_key": "",
                "client_email": "",
                "client_id": "",
                "auth_uri": "",
                "token_uri": "",
                "auth_provider_x509_cert_url": "",
                "client_x509_cert_url": "",
            },
        }))
}

pub fn alibaba_cloud_account() -> ResourceAdapter {
    provider_account("alibaba_cloud_account", "alibaba_cloud")
        .description("Alibaba Cloud account onboarded to Prisma Cloud")
        .identity_path("accountId")
        .name_path("name")
        .required_fields(&["accountId", "enabled", "groupIds", "name", "ramArn"])
        .defaults(json!({
            "accountId": "",
            "groupIds": [],
            "name": "",
            "enabled": false,
            "ramArn": "",
        }))
}

pub fn cloud_account() -> ResourceAdapter {
    ResourceAdapter::new("cloud_account", "name")
        .description("Cloud accounts of every provider")
        .identity_fields(&["name", "cloudType", "id"])
        .filter_fields(&["id", "cloudType"])
        .list(PathTemplate::literal(&["cloud", "name"]))
        .detail(
            PathTemplate::literal(&["cloud"])
                .field("cloudType")
                .field("id"),
        )
}

pub fn account_group() -> ResourceAdapter {
    ResourceAdapter::new("account_group", "name")
        .description("Account groups")
        .identity_fields(&["name", "id"])
        .filter_fields(&["id"])
        .list(PathTemplate::literal(&["cloud", "group"]))
        .detail(PathTemplate::literal(&["cloud", "group"]).field("id"))
}

pub fn compliance_standard() -> ResourceAdapter {
    ResourceAdapter::new("compliance_standard", "name")
        .description("Compliance standards")
        .identity_fields(&["name", "id", "cloudType", "systemDefault"])
        .filter_fields(&["id", "cloudType", "systemDefault"])
        .list(PathTemplate::literal(&["compliance"]))
        .detail(PathTemplate::literal(&["compliance"]).field("id"))
}

pub fn compliance_requirement() -> ResourceAdapter {
    ResourceAdapter::new("compliance_requirement", "name")
        .description("Requirements of one compliance standard")
        .identity_fields(&["name", "systemDefault", "id"])
        .filter_fields(&["id", "systemDefault"])
        .list(
            PathTemplate::literal(&["compliance"])
                .field("complianceId")
                .lit("requirement"),
        )
        .detail(PathTemplate::literal(&["compliance", "requirement"]).field("id"))
}

pub fn compliance_section() -> ResourceAdapter {
    ResourceAdapter::new("compliance_section", "sectionId")
        .description("Sections of one compliance requirement")
        .identity_fields(&["sectionId", "systemDefault"])
        .filter_fields(&["systemDefault"])
        .list(
            PathTemplate::literal(&["compliance"])
                .field("requirementId")
                .lit("section"),
        )
}

pub fn policy() -> ResourceAdapter {
    ResourceAdapter::new("policy", "name")
        .description("Policies")
        .identity_fields(&[
            "name",
            "policyId",
            "policyType",
            "systemDefault",
            "cloudType",
            "severity",
        ])
        .filter_fields(&[
            "policyId",
            "policyType",
            "systemDefault",
            "cloudType",
            "severity",
        ])
        .list(PathTemplate::literal(&["policy"]))
        .id_field("policyId")
        .detail(PathTemplate::literal(&["policy"]).field("policyId"))
}
