//! Resolves a `{id}`/`{name}` selector to a concrete entity id (§4.6).

use uuid::Uuid;

use crate::domain::LocalBudget;
use crate::errors::SyncError;

/// A selector accepting exactly one of `id` or `name`; both or neither present is
/// only an error for budget selection (which falls back to a memoized default) —
/// for accounts/categories/payees, "neither" is a caller error except where noted.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    pub id: Option<Uuid>,
    pub name: Option<String>,
}

impl Selector {
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            name: None,
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
        }
    }

    fn validate(&self) -> Result<(), SyncError> {
        if self.id.is_some() && self.name.is_some() {
            return Err(SyncError::SelectorAmbiguous {
                query: "selector specifies both id and name".into(),
                candidates: vec![],
            });
        }
        Ok(())
    }
}

/// Resolves budget selectors against a listing, with a per-process memoized
/// last-resolved id used when no selector is supplied (§4.6).
#[derive(Default)]
pub struct BudgetSelectorResolver {
    last_resolved_id: std::sync::Mutex<Option<Uuid>>,
}

impl BudgetSelectorResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(
        &self,
        selector: &Selector,
        budgets: &[crate::domain::BudgetListEntry],
    ) -> Result<Uuid, SyncError> {
        selector.validate()?;

        let resolved = if let Some(id) = selector.id {
            budgets
                .iter()
                .find(|b| b.id == id)
                .map(|b| b.id)
                .ok_or_else(|| {
                    SyncError::SelectorUnresolved(format!(
                        "no budget with id {id}; available: {}",
                        available_names(budgets)
                    ))
                })?
        } else if let Some(name) = &selector.name {
            let lowered = name.to_lowercase();
            budgets
                .iter()
                .find(|b| b.name.to_lowercase() == lowered)
                .map(|b| b.id)
                .ok_or_else(|| {
                    SyncError::SelectorUnresolved(format!(
                        "no budget with name {name}; available: {}",
                        available_names(budgets)
                    ))
                })?
        } else if let Some(last) = *self.last_resolved_id.lock().unwrap() {
            last
        } else if budgets.len() == 1 {
            budgets[0].id
        } else {
            return Err(SyncError::SelectorUnresolved(
                "multiple budgets; specify one".into(),
            ));
        };

        *self.last_resolved_id.lock().unwrap() = Some(resolved);
        Ok(resolved)
    }
}

fn available_names(budgets: &[crate::domain::BudgetListEntry]) -> String {
    budgets
        .iter()
        .map(|b| b.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolves an account selector against a synced replica.
pub fn resolve_account<'a>(
    selector: &Selector,
    local: &'a LocalBudget,
) -> Result<&'a crate::domain::Account, SyncError> {
    selector.validate()?;
    if let Some(id) = selector.id {
        return local.account(id).ok_or_else(|| {
            SyncError::SelectorUnresolved(format!("no account with id {id}"))
        });
    }
    if let Some(name) = &selector.name {
        return resolve_by_name(name, &local.accounts, |a| &a.name).and_then(|id| {
            local
                .account(id)
                .ok_or_else(|| SyncError::SelectorUnresolved(format!("no account with id {id}")))
        });
    }
    Err(SyncError::SelectorUnresolved("no account selector provided".into()))
}

/// Resolves a category selector against a synced replica.
pub fn resolve_category<'a>(
    selector: &Selector,
    local: &'a LocalBudget,
) -> Result<&'a crate::domain::Category, SyncError> {
    selector.validate()?;
    if let Some(id) = selector.id {
        return local.category(id).ok_or_else(|| {
            SyncError::SelectorUnresolved(format!("no category with id {id}"))
        });
    }
    if let Some(name) = &selector.name {
        return resolve_by_name(name, &local.categories, |c| &c.name).and_then(|id| {
            local
                .category(id)
                .ok_or_else(|| SyncError::SelectorUnresolved(format!("no category with id {id}")))
        });
    }
    Err(SyncError::SelectorUnresolved("no category selector provided".into()))
}

/// Resolves a payee selector. Per §4.6, when neither `id` nor `name` is supplied this
/// returns `Ok(None)` rather than erroring — a transaction may legitimately have no
/// payee.
pub fn resolve_payee<'a>(
    selector: &Selector,
    local: &'a LocalBudget,
) -> Result<Option<&'a crate::domain::Payee>, SyncError> {
    selector.validate()?;
    if let Some(id) = selector.id {
        return local
            .payee(id)
            .map(Some)
            .ok_or_else(|| SyncError::SelectorUnresolved(format!("no payee with id {id}")));
    }
    if let Some(name) = &selector.name {
        let id = resolve_by_name(name, &local.payees, |p| &p.name)?;
        return local
            .payee(id)
            .map(Some)
            .ok_or_else(|| SyncError::SelectorUnresolved(format!("no payee with id {id}")));
    }
    Ok(None)
}

/// Exact lowercased-name resolution against `entities`, erroring with an enumerated
/// candidate list on zero or multiple case-insensitive-but-not-exact matches
/// (Scenario F: "chase" matches neither "Chase Checking" nor "Chase Savings" exactly
/// once lowercased, so both are listed as candidates).
fn resolve_by_name<T>(
    name: &str,
    entities: &[T],
    name_of: impl Fn(&T) -> &String,
) -> Result<Uuid, SyncError>
where
    T: crate::domain::HasId,
{
    let lowered = name.to_lowercase();
    let matches: Vec<&T> = entities
        .iter()
        .filter(|e| name_of(e).to_lowercase() == lowered)
        .collect();

    match matches.len() {
        1 => Ok(matches[0].entity_id()),
        0 => Err(SyncError::SelectorUnresolved(format!(
            "no entity named {name}; available: {}",
            entities
                .iter()
                .map(|e| name_of(e).as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
        _ => Err(SyncError::SelectorAmbiguous {
            query: name.to_string(),
            candidates: matches.iter().map(|e| name_of(e).clone()).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Account, AccountType, BudgetListEntry};

    fn account(id: Uuid, name: &str) -> Account {
        Account {
            id,
            name: name.into(),
            account_type: AccountType::Checking,
            on_budget: true,
            closed: false,
            balance: 0,
            cleared_balance: 0,
            uncleared_balance: 0,
            direct_import_linked: false,
            direct_import_in_error: false,
            last_reconciled_at: None,
            deleted: false,
        }
    }

    #[test]
    fn ambiguous_id_and_name_is_rejected() {
        let selector = Selector {
            id: Some(Uuid::new_v4()),
            name: Some("Checking".into()),
        };
        let resolver = BudgetSelectorResolver::new();
        let result = resolver.resolve(&selector, &[]);
        assert!(matches!(result, Err(SyncError::SelectorAmbiguous { .. })));
    }

    #[test]
    fn sole_budget_resolves_when_no_selector_given() {
        let id = Uuid::new_v4();
        let budgets = vec![BudgetListEntry {
            id,
            name: "Household".into(),
        }];
        let resolver = BudgetSelectorResolver::new();
        let resolved = resolver.resolve(&Selector::default(), &budgets).unwrap();
        assert_eq!(resolved, id);
    }

    #[test]
    fn last_resolved_id_is_memoized() {
        let id = Uuid::new_v4();
        let budgets = vec![BudgetListEntry {
            id,
            name: "Household".into(),
        }];
        let resolver = BudgetSelectorResolver::new();
        resolver.resolve(&Selector::by_id(id), &budgets).unwrap();
        let resolved = resolver.resolve(&Selector::default(), &[]).unwrap();
        assert_eq!(resolved, id);
    }

    #[test]
    fn ambiguous_name_lists_candidates() {
        let mut local = LocalBudget::empty(Uuid::new_v4(), "Test");
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        local.accounts.push(account(a, "Chase Checking"));
        local.accounts.push(account(b, "Chase Savings"));
        crate::merge::rebuild_indexes(&mut local);

        let selector = Selector::by_name("chase");
        let result = resolve_account(&selector, &local);
        match result {
            Err(SyncError::SelectorUnresolved(msg)) => {
                assert!(msg.contains("Chase Checking"));
                assert!(msg.contains("Chase Savings"));
            }
            other => panic!("expected SelectorUnresolved, got {other:?}"),
        }
    }
}
