// ABOUTME: Built-in UI capabilities registered on every connection by the server binary
// ABOUTME: Provides the accounts list UI resource and the CRM-CoE, accounts, URL, and dashboard tools
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::capabilities::{
    CapabilityRegistry, ContentBlock, ResourceDescriptor, ResourceHandler, ToolDescriptor,
    ToolHandler,
};
use super::ui_resource;
use crate::errors::AppResult;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

const ACCOUNTS_LIST_HTML: &str = include_str!("../../templates/accounts_list.html");
const DASHBOARD_HTML: &str = include_str!("../../templates/dashboard.html");

/// URI of the accounts list UI resource
pub const ACCOUNTS_LIST_URI: &str = "ui://accounts/list";
/// URI of the dashboard UI resource
pub const DASHBOARD_URI: &str = "ui://dashboard/main";
/// Page framed by the external URL resources
const EXTERNAL_PAGE_URL: &str = "https://google.com";

fn no_arguments() -> Value {
    json!({ "type": "object", "properties": {} })
}

fn tool(name: &str, description: &str) -> ToolDescriptor {
    ToolDescriptor {
        name: name.to_owned(),
        description: description.to_owned(),
        input_schema: no_arguments(),
    }
}

/// `ui://accounts/list`: client accounts as inline HTML
pub struct AccountsListResource;

#[async_trait]
impl ResourceHandler for AccountsListResource {
    fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor {
            uri: ACCOUNTS_LIST_URI.to_owned(),
            name: "accounts-list".to_owned(),
            description: "Client accounts and balances".to_owned(),
            mime_type: ui_resource::MIME_RAW_HTML.to_owned(),
        }
    }

    async fn read(&self) -> AppResult<String> {
        Ok(ACCOUNTS_LIST_HTML.to_owned())
    }
}

/// Fixed statement returned verbatim
pub struct CrmCoeTool;

#[async_trait]
impl ToolHandler for CrmCoeTool {
    fn descriptor(&self) -> ToolDescriptor {
        tool(
            "CRM-CoE",
            "AI should return the return text as it is without any Gen AI augmentation",
        )
    }

    async fn call(&self, _arguments: Value) -> AppResult<Vec<ContentBlock>> {
        Ok(vec![ContentBlock::text(
            "CRM-CoE is leading the Low Code Technologies in Natwest Bank",
        )])
    }
}

/// Accounts view as an external URL UI resource, serialized into a text block
pub struct ListAccountsTool;

#[async_trait]
impl ToolHandler for ListAccountsTool {
    fn descriptor(&self) -> ToolDescriptor {
        tool(
            "list_accounts",
            "Lists all client accounts available in the database",
        )
    }

    async fn call(&self, _arguments: Value) -> AppResult<Vec<ContentBlock>> {
        let resource = ui_resource::external_url(ACCOUNTS_LIST_URI, EXTERNAL_PAGE_URL)?;
        Ok(vec![ui_resource::as_text_block(resource)?])
    }
}

/// External URL UI resource returned as an embedded resource block
pub struct ShowPpUrlTool;

#[async_trait]
impl ToolHandler for ShowPpUrlTool {
    fn descriptor(&self) -> ToolDescriptor {
        tool("show_pp_url", "show a power platform url to test")
    }

    async fn call(&self, _arguments: Value) -> AppResult<Vec<ContentBlock>> {
        let resource = ui_resource::external_url(ACCOUNTS_LIST_URI, EXTERNAL_PAGE_URL)?;
        Ok(vec![ContentBlock::resource(resource)])
    }
}

/// Financial dashboard as inline HTML, serialized into a text block
pub struct ShowDashboardTool;

#[async_trait]
impl ToolHandler for ShowDashboardTool {
    fn descriptor(&self) -> ToolDescriptor {
        tool("show_dashboard", "Displays a rich, complex HTML dashboard")
    }

    async fn call(&self, _arguments: Value) -> AppResult<Vec<ContentBlock>> {
        let resource = ui_resource::raw_html(DASHBOARD_URI, DASHBOARD_HTML)?;
        Ok(vec![ui_resource::as_text_block(resource)?])
    }
}

/// Register every built-in capability
///
/// # Errors
///
/// Returns an error if any of them is already registered
pub fn register_builtin(registry: &mut CapabilityRegistry) -> AppResult<()> {
    registry.register_resource(Arc::new(AccountsListResource))?;
    registry.register_tool(Arc::new(CrmCoeTool))?;
    registry.register_tool(Arc::new(ListAccountsTool))?;
    registry.register_tool(Arc::new(ShowPpUrlTool))?;
    registry.register_tool(Arc::new(ShowDashboardTool))?;
    Ok(())
}
