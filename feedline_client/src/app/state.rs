use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => f.write_str("create"),
            Operation::Update => f.write_str("update"),
            Operation::Delete => f.write_str("delete"),
        }
    }
}

/// Pending flag and last failure of one mutation kind. A second submit is
/// refused while `pending` is set.
#[derive(Debug, Default, Clone)]
pub struct MutationState {
    pub pending: bool,
    pub error: Option<String>,
}

impl MutationState {
    pub(super) fn start(&mut self) {
        self.pending = true;
        self.error = None;
    }

    pub(super) fn succeed(&mut self) {
        self.pending = false;
        self.error = None;
    }

    pub(super) fn fail(&mut self, error: String) {
        self.pending = false;
        self.error = Some(error);
    }
}

#[derive(Debug, Default, Clone)]
pub struct MutationStates {
    pub create: MutationState,
    pub update: MutationState,
    pub delete: MutationState,
}

impl MutationStates {
    pub fn get(&self, operation: Operation) -> &MutationState {
        match operation {
            Operation::Create => &self.create,
            Operation::Update => &self.update,
            Operation::Delete => &self.delete,
        }
    }

    pub(super) fn get_mut(&mut self, operation: Operation) -> &mut MutationState {
        match operation {
            Operation::Create => &mut self.create,
            Operation::Update => &mut self.update,
            Operation::Delete => &mut self.delete,
        }
    }

    pub fn any_pending(&self) -> bool {
        self.create.pending || self.update.pending || self.delete.pending
    }
}
