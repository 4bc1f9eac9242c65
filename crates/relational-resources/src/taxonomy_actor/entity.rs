//! Entity trait implementation for taxonomy terms.

use super::TermAction;
use crate::error::{DomainError, Validator};
use crate::model::{Term, TermCreate, TermDelete, TermFilter, TermId, TermUpdate, User};
use actor_framework::ActorEntity;
use async_trait::async_trait;

fn require_admin(actor: &User) -> Result<(), DomainError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(DomainError::forbidden("Administrator role required"))
    }
}

#[async_trait]
impl ActorEntity for Term {
    type Id = TermId;
    type Create = TermCreate;
    type Update = TermUpdate;
    type Delete = TermDelete;
    type Filter = TermFilter;
    type Action = TermAction;
    type ActionResult = Term;
    type Context = ();
    type Error = DomainError;

    fn from_create_params(id: TermId, params: TermCreate) -> Result<Self, Self::Error> {
        require_admin(&params.actor)?;
        let mut v = Validator::new();
        v.length("name", &params.name, 1, 255);
        v.finish()?;
        Ok(Self {
            id,
            kind: params.kind,
            name: params.name.trim().to_string(),
            description: params.description,
            is_active: true,
            sort_order: params.sort_order,
        })
    }

    fn matches(&self, filter: &TermFilter) -> bool {
        filter.kind.map_or(true, |kind| self.kind == kind) && (!filter.active_only || self.is_active)
    }

    async fn on_update(&mut self, update: TermUpdate, _ctx: &()) -> Result<(), Self::Error> {
        require_admin(&update.actor)?;
        if let Some(name) = update.name {
            let mut v = Validator::new();
            v.length("name", &name, 1, 255);
            v.finish()?;
            self.name = name.trim().to_string();
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(sort_order) = update.sort_order {
            self.sort_order = sort_order;
        }
        Ok(())
    }

    async fn on_delete(&self, params: TermDelete, _ctx: &()) -> Result<(), Self::Error> {
        require_admin(&params.actor)?;
        if params.resources > 0 {
            return Err(DomainError::invalid(
                "term",
                format!("Cannot delete a {} used by {} resources", self.kind.as_str(), params.resources),
            ));
        }
        Ok(())
    }

    async fn handle_action(&mut self, action: TermAction, _ctx: &()) -> Result<Term, Self::Error> {
        match action {
            TermAction::SetActive { actor, active } => {
                require_admin(&actor)?;
                self.is_active = active;
                Ok(self.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Role, TermKind, UserId};

    fn category() -> Term {
        Term {
            id: TermId(1),
            kind: TermKind::Category,
            name: "Family".into(),
            description: None,
            is_active: true,
            sort_order: 0,
        }
    }

    #[tokio::test]
    async fn test_delete_refused_while_resources_use_the_term() {
        let admin = User::new(UserId(1), "root", Role::Administrator);
        let term = category();

        let err = term.on_delete(TermDelete::new(admin.clone(), 2), &()).await.unwrap_err();
        assert_eq!(
            err,
            DomainError::invalid("term", "Cannot delete a category used by 2 resources")
        );
        assert!(term.on_delete(TermDelete::new(admin, 0), &()).await.is_ok());

        let citizen = User::new(UserId(2), "una", Role::Citizen);
        let err = term.on_delete(TermDelete::new(citizen, 0), &()).await.unwrap_err();
        assert_eq!(err.status_code(), 403);
    }
}
