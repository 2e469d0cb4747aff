//! A normalized document with sequential ids for driving a [`Session`].

use crate::ast::Ast;
use crate::ast::id::{NodeId, SequentialIds};
use crate::ast::normalize::normalize;
use crate::ast::query::{flatten_leaves, get_first_inline};
use crate::editing::session::Session;
use crate::options::EngineOptions;
use crate::parsing::link_refs::LinkRefs;
use crate::parsing::parse_document;

pub(crate) struct Doc {
    pub ast: Ast,
    pub refs: LinkRefs,
    pub options: EngineOptions,
    pub ids: SequentialIds,
}

impl Doc {
    pub fn new(src: &str) -> Self {
        let options = EngineOptions::default();
        let mut ids = SequentialIds::default();
        let mut doc = parse_document(src, &options.parse, &mut ids);
        normalize(&mut doc.ast, &options.parse);
        Self {
            ast: doc.ast,
            refs: doc.refs,
            options,
            ids,
        }
    }

    pub fn session(&mut self) -> Session<'_> {
        Session {
            ast: &mut self.ast,
            refs: &self.refs,
            options: &self.options,
            ids: &mut self.ids,
        }
    }

    pub fn text(&mut self) -> String {
        normalize(&mut self.ast, &self.options.parse)
    }

    /// The `n`th leaf in document order.
    pub fn leaf(&self, n: usize) -> NodeId {
        flatten_leaves(&self.ast)[n]
    }

    /// First content inline of the `n`th leaf.
    pub fn inline(&self, n: usize) -> NodeId {
        get_first_inline(self.ast.block(self.leaf(n)).unwrap()).unwrap().id
    }

    /// Container of the `n`th leaf: its list item, cell or quote.
    pub fn holder(&self, n: usize) -> NodeId {
        self.ast.parent_of(self.leaf(n)).unwrap()
    }
}
