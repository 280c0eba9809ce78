use serde::Deserialize;
use serde_json::json;
use tracing::*;

use crate::OpenStack;
use crate::errors::*;

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct Role {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize)]
struct RoleResponse {
    role: Role,
}

#[derive(Deserialize)]
struct RoleList {
    roles: Vec<Role>,
}

impl OpenStack {
    // Returns the id of the role, creating it first if it doesn't exist yet
    pub async fn create_role(&self, role_name: &str) -> anyhow::Result<String> {
        match self.get_role(role_name).await {
            Ok(role) => return Ok(role.id),
            Err(err) if is_keystone_not_found(&err) => (),
            Err(err) => return Err(err),
        }

        let resp: RoleResponse = self.post("roles", &json!({"role": {"name": role_name}})).await?;
        info!("role {} created with id {}", resp.role.name, resp.role.id);
        Ok(resp.role.id)
    }

    pub async fn get_role(&self, role_name: &str) -> anyhow::Result<Role> {
        let resp: RoleList = self.get("roles", &[("name", role_name)]).await?;
        match resp.roles.into_iter().next() {
            Some(role) => Ok(role),
            None => bail!(OpenStackError::not_found(&format!("{role_name} role"))),
        }
    }

    pub async fn assign_user_role(&self, role_name: &str, user_id: &str, project_id: &str) -> EmptyResult {
        let role = self.get_role(role_name).await?;
        info!("assigning user {user_id} to role {} ({})", role.name, role.id);
        self.put(&format!("projects/{project_id}/users/{user_id}/roles/{}", role.id)).await
    }
}
