use super::types::{Plan, PlanId, PlanKind, PlanType};

/// Editable, ordered collection of plans with session-unique ids.
#[derive(Debug, Clone)]
pub struct PlanSet {
    plans: Vec<Plan>,
    next_id: PlanId,
}

impl Default for PlanSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanSet {
    pub fn new() -> Self {
        Self {
            plans: Vec::new(),
            next_id: 1,
        }
    }

    /// Appends a plan of `plan_type` with editor defaults and returns it.
    pub fn add(&mut self, plan_type: PlanType) -> &Plan {
        let kind = match plan_type {
            PlanType::Salary => PlanKind::Salary {
                yearly_increase: Some(0.0),
            },
            PlanType::Savings => PlanKind::Savings {
                is_percentage: false,
            },
            PlanType::Withdrawal => PlanKind::Withdrawal,
        };
        let id = self.next_id;
        self.next_id += 1;
        self.plans.push(Plan {
            id,
            kind,
            amount: 0.0,
            start_year: 0,
            duration: 1,
        });
        &self.plans[self.plans.len() - 1]
    }

    /// Appends a plan that already carries an id, such as one decoded from a
    /// saved session. Refused when the id is taken; later `add` calls never
    /// hand out an id at or below it.
    pub fn insert(&mut self, plan: Plan) -> bool {
        if self.get(plan.id).is_some() {
            return false;
        }
        self.next_id = self.next_id.max(plan.id.saturating_add(1));
        self.plans.push(plan);
        true
    }

    pub fn remove(&mut self, id: PlanId) -> Option<Plan> {
        let index = self.plans.iter().position(|p| p.id == id)?;
        Some(self.plans.remove(index))
    }

    /// Swaps in `plan` for the stored plan with the same id. The plan type is
    /// fixed at creation, so a replacement of a different type is refused.
    pub fn replace(&mut self, plan: Plan) -> bool {
        match self.plans.iter_mut().find(|p| p.id == plan.id) {
            Some(slot) if slot.kind.plan_type() == plan.kind.plan_type() => {
                *slot = plan;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: PlanId) -> Option<&Plan> {
        self.plans.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Latest year any plan is still active in, plus one.
    pub fn horizon_years(&self) -> Option<u32> {
        self.plans.iter().map(Plan::end_year).max()
    }

    pub fn into_plans(self) -> Vec<Plan> {
        self.plans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_assigns_sequential_ids_and_type_defaults() {
        let mut set = PlanSet::new();
        let salary = set.add(PlanType::Salary).clone();
        let savings = set.add(PlanType::Savings).clone();
        let withdrawal = set.add(PlanType::Withdrawal).clone();

        assert_eq!((salary.id, savings.id, withdrawal.id), (1, 2, 3));
        assert_eq!(
            salary.kind,
            PlanKind::Salary {
                yearly_increase: Some(0.0)
            }
        );
        assert_eq!(
            savings.kind,
            PlanKind::Savings {
                is_percentage: false
            }
        );
        assert_eq!(withdrawal.kind, PlanKind::Withdrawal);
        for plan in [&salary, &savings, &withdrawal] {
            assert_eq!(plan.amount, 0.0);
            assert_eq!(plan.start_year, 0);
            assert_eq!(plan.duration, 1);
        }
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut set = PlanSet::new();
        let first = set.add(PlanType::Salary).id;
        assert!(set.remove(first).is_some());
        assert!(set.remove(first).is_none());
        assert!(set.is_empty());

        let second = set.add(PlanType::Salary).id;
        assert_ne!(first, second);
    }

    #[test]
    fn replace_keeps_position_and_rejects_type_change() {
        let mut set = PlanSet::new();
        set.add(PlanType::Savings);
        let id = set.add(PlanType::Salary).id;
        set.add(PlanType::Withdrawal);

        let mut changed = set.get(id).cloned().expect("plan exists");
        changed.amount = 3_000.0;
        changed.duration = 5;
        assert!(set.replace(changed));
        let ordered = set.clone().into_plans();
        assert_eq!(ordered[1].amount, 3_000.0);
        assert_eq!(ordered[1].duration, 5);

        let mut retyped = set.get(id).cloned().expect("plan exists");
        retyped.kind = PlanKind::Withdrawal;
        assert!(!set.replace(retyped));

        let unknown = Plan {
            id: 99,
            kind: PlanKind::Withdrawal,
            amount: 4.0,
            start_year: 0,
            duration: 1,
        };
        assert!(!set.replace(unknown));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn horizon_is_latest_plan_end() {
        let mut set = PlanSet::new();
        assert_eq!(set.horizon_years(), None);

        let id = set.add(PlanType::Salary).id;
        let mut plan = set.get(id).cloned().expect("plan exists");
        plan.start_year = 4;
        plan.duration = 6;
        set.replace(plan);
        set.add(PlanType::Savings);

        assert_eq!(set.horizon_years(), Some(10));
    }

    #[test]
    fn insert_keeps_given_ids_and_refuses_duplicates() {
        let mut set = PlanSet::new();
        let plan = |id| Plan {
            id,
            kind: PlanKind::Withdrawal,
            amount: 4.0,
            start_year: 0,
            duration: 1,
        };

        assert!(set.insert(plan(7)));
        assert!(set.insert(plan(3)));
        assert!(!set.insert(plan(7)));
        assert_eq!(set.len(), 2);

        let next = set.add(PlanType::Savings).id;
        assert_eq!(next, 8);
        let ids: Vec<PlanId> = set.into_plans().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![7, 3, 8]);
    }
}
