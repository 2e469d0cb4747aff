//! Code block editing.
//!
//! A code block's inline run is its open fence marker, one text inline with
//! the payload (or the empty sentinel) and, when closed, the close fence
//! marker; indented blocks have only the text inline. Payload edits rewrite
//! the text inline in place. Fence edits re-derive the fence attributes, and
//! fall back to re-parsing the whole block when the fence stops being one.

use crate::ast::id::NodeId;
use crate::ast::node::{Block, BlockKind, CodeBlockInfo, Inline};
use crate::ast::normalize::{fence_parts, leaf_text};
use crate::parsing::blocks::kinds::CodeFence;
use crate::parsing::blocks::leaf::{code_block_inlines, is_sentinel};
use crate::parsing::rope::floor_char_boundary;

use crate::editing::effect::{Caret, Effect};
use crate::editing::error::{EditError, EditResult, OrPrecondition};
use crate::editing::session::{Session, visible_len};

/// Which part of a code block an inline is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Open,
    Body,
    Close,
}

/// Inline indices of the open marker, payload and close marker.
fn role_indices(inlines: &[Inline]) -> [Option<usize>; 3] {
    let body = inlines.iter().position(|i| !i.is_marker());
    let open = inlines.first().filter(|i| i.is_marker()).map(|_| 0);
    let close = body.map(|b| b + 1).filter(|c| *c < inlines.len());
    [open, body, close]
}

fn role_of(inlines: &[Inline], id: NodeId) -> Option<Role> {
    let idx = inlines.iter().position(|i| i.id == id)?;
    let [open, body, close] = role_indices(inlines);
    if open == Some(idx) {
        Some(Role::Open)
    } else if body == Some(idx) {
        Some(Role::Body)
    } else if close == Some(idx) {
        Some(Role::Close)
    } else {
        None
    }
}

/// Fence attributes, payload and close line of a code block.
struct CodeParts {
    info: CodeBlockInfo,
    open: String,
    payload: Option<String>,
    close: Option<String>,
}

impl CodeParts {
    fn of(block: &Block) -> EditResult<Self> {
        let BlockKind::CodeBlock(info) = &block.kind else {
            return Err(EditError::Precondition("not a code block"));
        };
        if !info.fenced {
            let payload = block
                .inlines
                .iter()
                .find(|i| !i.is_marker() && !is_sentinel(i))
                .map(|i| i.symbolic().to_string());
            return Ok(Self {
                info: info.clone(),
                open: String::new(),
                payload,
                close: None,
            });
        }
        let (open, payload, close) = fence_parts(&block.inlines);
        Ok(Self {
            info: info.clone(),
            open: open.to_string(),
            payload: payload.map(str::to_string),
            close: close.map(str::to_string),
        })
    }

    /// The block's source text with `open` standing in for the fence line.
    fn source_with(&self, open: &str) -> String {
        let mut s = open.to_string();
        for part in [self.payload.as_deref(), self.close.as_deref()].into_iter().flatten() {
            s.push('\n');
            s.push_str(part);
        }
        s
    }

    fn payload_len(&self) -> usize {
        self.payload.as_deref().map_or(0, str::len)
    }
}

/// Whether some payload line would end a fence opened with `info`.
fn payload_closes(info: &CodeBlockInfo, payload: Option<&str>) -> bool {
    payload.is_some_and(|p| p.split('\n').any(|line| CodeFence::closes(info, line)))
}

fn code_text(info: &CodeBlockInfo, payload: Option<&str>, close: Option<&str>) -> String {
    if !info.fenced {
        return payload
            .unwrap_or_default()
            .split('\n')
            .map(|line| format!("{}{line}", CodeFence::INDENT))
            .collect::<Vec<_>>()
            .join("\n");
    }
    let mut s = info.open_marker();
    if let Some(p) = payload {
        s.push('\n');
        s.push_str(p);
    }
    if info.closed {
        s.push('\n');
        s.push_str(&close.map_or_else(|| info.close_marker(), str::to_string));
    }
    s
}

impl Session<'_> {
    /// Rebuilds a code block's inline run, keeping the ids of the inlines
    /// that play the same role as before. Returns the payload inline's id.
    fn rebuild_code(
        &mut self,
        id: NodeId,
        info: CodeBlockInfo,
        payload: Option<&str>,
        close: Option<&str>,
    ) -> EditResult<NodeId> {
        let old = self.block(id)?.inlines.clone();
        let mut inlines = code_block_inlines(id, &info, payload, close, self.ids);
        let new_roles = role_indices(&inlines);
        for (new, prev) in new_roles.into_iter().zip(role_indices(&old)) {
            if let (Some(n), Some(o)) = (new, prev) {
                inlines[n].id = old[o].id;
            }
        }
        let body = new_roles[1]
            .map(|i| inlines[i].id)
            .or_precondition("code block without payload inline")?;
        let text = code_text(&info, payload, close);
        let block = self.ast.block_mut(id).or_precondition("unknown block")?;
        block.kind = BlockKind::CodeBlock(info);
        block.inlines = inlines;
        block.text = text;
        Ok(body)
    }

    /// Typing inside a code block: `inline` is the fence line, the payload
    /// or the close line.
    pub fn input_code_block(&mut self, inline: NodeId, symbolic: &str, caret: usize) -> EditResult<Effect> {
        let (block, _) = self.resolve(inline)?;
        let parts = CodeParts::of(&block)?;
        let caret = floor_char_boundary(symbolic, caret.min(symbolic.len()));
        match role_of(&block.inlines, inline).or_precondition("inline is not part of the code block")? {
            Role::Body => {
                if !parts.info.fenced && symbolic.trim().is_empty() {
                    return self.transform_block(block.id, symbolic, caret);
                }
                let payload = (!symbolic.is_empty()).then_some(symbolic);
                if parts.info.fenced && payload_closes(&parts.info, payload) {
                    let text = code_text(&parts.info, payload, parts.close.as_deref());
                    return self.transform_block(block.id, &text, parts.open.len() + 1 + caret);
                }
                let body = self.rebuild_code(block.id, parts.info, payload, parts.close.as_deref())?;
                Ok(Effect::new()
                    .current(block.id, block.id)
                    .with_caret(Some(Caret::new(body, caret))))
            }
            Role::Open => self.sync_fence(&block, &parts, symbolic, caret),
            Role::Close => {
                if CodeFence::closes(&parts.info, symbolic) {
                    self.rebuild_code(block.id, parts.info, parts.payload.as_deref(), Some(symbolic))?;
                    return Ok(Effect::new()
                        .current(block.id, block.id)
                        .with_caret(Some(Caret::new(inline, caret))));
                }
                let mut text = parts.source_with(&parts.open);
                let close_start = parts.open.len() + parts.payload.as_ref().map_or(0, |p| p.len() + 1) + 1;
                text.truncate(close_start);
                text.push_str(symbolic);
                self.transform_block(block.id, &text, close_start + caret)
            }
        }
    }

    /// Enter inside a code block: the fence line breaks, the close line exits,
    /// and the payload gains a newline. Enter at the end of a payload that
    /// already ends in an empty line exits the block instead.
    pub(crate) fn enter_code_block(&mut self, inline: NodeId, caret: usize) -> EditResult<Effect> {
        let (block, target) = self.resolve(inline)?;
        match role_of(&block.inlines, inline).or_precondition("inline is not part of the code block")? {
            Role::Open => self.split_code_block_from_marker(inline, caret),
            Role::Close => self.exit_code_block(block.id),
            Role::Body => {
                let payload = CodeParts::of(&block)?.payload.unwrap_or_default();
                let at_end = caret >= visible_len(&target);
                if at_end && payload.ends_with('\n') {
                    self.exit_code_block(block.id)
                } else {
                    self.split_code_block(inline, caret)
                }
            }
        }
    }

    /// Whether `inline` is the payload inline of its code block.
    pub(crate) fn is_code_payload(&self, inline: NodeId) -> bool {
        self.resolve(inline).is_ok_and(|(block, _)| {
            matches!(block.kind, BlockKind::CodeBlock(_)) && role_of(&block.inlines, inline) == Some(Role::Body)
        })
    }

    /// Re-derives a code block's fence attributes from its open marker text.
    pub fn sync_code_block_from_marker(&mut self, block: NodeId) -> EditResult<Effect> {
        let block = self.block(block)?.clone();
        let parts = CodeParts::of(&block)?;
        if !parts.info.fenced {
            return Err(EditError::Precondition("indented code has no fence"));
        }
        let open = parts.open.clone();
        self.sync_fence(&block, &parts, &open, open.len())
    }

    /// Applies `open` as the block's fence line. The block stays a code block
    /// only while `open` is a fence the payload does not close; otherwise the
    /// whole text is parsed again.
    fn sync_fence(&mut self, block: &Block, parts: &CodeParts, open: &str, caret: usize) -> EditResult<Effect> {
        let info = CodeFence::open(open).filter(|info| !payload_closes(info, parts.payload.as_deref()));
        let Some(mut info) = info else {
            return self.transform_block(block.id, &parts.source_with(open), caret);
        };
        info.closed = parts.info.closed;
        let close = parts.close.as_deref().filter(|c| CodeFence::closes(&info, c));
        self.rebuild_code(block.id, info, parts.payload.as_deref(), close)?;
        let caret = block
            .inlines
            .first()
            .filter(|i| i.is_marker())
            .map(|i| Caret::new(i.id, caret));
        Ok(Effect::new().current(block.id, block.id).with_caret(caret))
    }

    /// Enter inside the payload: a newline at `caret`.
    pub fn split_code_block(&mut self, inline: NodeId, caret: usize) -> EditResult<Effect> {
        let (block, _) = self.resolve(inline)?;
        if role_of(&block.inlines, inline) != Some(Role::Body) {
            return Err(EditError::Precondition("caret is not in the code payload"));
        }
        let parts = CodeParts::of(&block)?;
        let body = parts.payload.unwrap_or_default();
        let at = floor_char_boundary(&body, caret.min(body.len()));
        let payload = format!("{}\n{}", &body[..at], &body[at..]);
        let id = self.rebuild_code(block.id, parts.info, Some(&payload), parts.close.as_deref())?;
        Ok(Effect::new()
            .current(block.id, block.id)
            .with_caret(Some(Caret::new(id, at + 1))))
    }

    /// Backspace at the start of the payload. The first payload line joins
    /// the fence line and the result is parsed again; an empty or indented
    /// block is unwrapped into paragraphs instead.
    pub fn merge_code_block_content(&mut self, inline: NodeId) -> EditResult<Effect> {
        let (block, _) = self.resolve(inline)?;
        if role_of(&block.inlines, inline) != Some(Role::Body) {
            return Err(EditError::Precondition("caret is not in the code payload"));
        }
        let parts = CodeParts::of(&block)?;
        let Some(payload) = parts.payload.as_deref().filter(|_| parts.info.fenced) else {
            return self.unwrap_code_block(block.id);
        };
        let (first, rest) = match payload.split_once('\n') {
            Some((first, rest)) => (first, Some(rest)),
            None => (payload, None),
        };
        let mut text = format!("{}{first}", parts.open);
        for part in [rest, parts.close.as_deref()].into_iter().flatten() {
            text.push('\n');
            text.push_str(part);
        }
        self.transform_block(block.id, &text, parts.open.len())
    }

    /// Enter inside the fence line: the line breaks at `caret` and the block
    /// is parsed again, usually leaving a paragraph above a new fence.
    pub fn split_code_block_from_marker(&mut self, inline: NodeId, caret: usize) -> EditResult<Effect> {
        let (block, target) = self.resolve(inline)?;
        if role_of(&block.inlines, inline) != Some(Role::Open) {
            return Err(EditError::Precondition("caret is not in the fence line"));
        }
        let parts = CodeParts::of(&block)?;
        let open = target.symbolic();
        let at = floor_char_boundary(open, caret.min(open.len()));
        let split = format!("{}\n{}", &open[..at], &open[at..]);
        self.transform_block(block.id, &parts.source_with(&split), at + 1)
    }

    /// Leaves the code block: one trailing empty payload line is dropped, the
    /// fence is closed and an empty paragraph follows with the caret.
    pub fn exit_code_block(&mut self, block: NodeId) -> EditResult<Effect> {
        let code = self.block(block)?.clone();
        let mut parts = CodeParts::of(&code)?;
        let payload = match parts.payload.take() {
            Some(p) if p.is_empty() => None,
            Some(p) => Some(p.strip_suffix('\n').map(str::to_string).unwrap_or(p)),
            None => None,
        };
        parts.info.closed = true;
        self.rebuild_code(block, parts.info, payload.as_deref(), parts.close.as_deref())?;

        let parent = self.parent(block)?;
        let index = self.index(block)? + 1;
        let paragraph = self.empty_paragraph();
        let id = paragraph.id;
        self.insert_at("exit code", parent, index, vec![paragraph])?;
        let caret = self.caret_start(id);
        Ok(Effect::new()
            .current(block, block)
            .next(block, id)
            .with_caret(caret))
    }

    /// Turns a code block back into ordinary blocks parsed from its payload.
    pub fn unwrap_code_block(&mut self, block: NodeId) -> EditResult<Effect> {
        let code = self.block(block)?.clone();
        let parts = CodeParts::of(&code)?;
        let nodes = self.fragment(parts.payload.as_deref().unwrap_or_default(), code.span.start);
        let ids = self.replace("unwrap code", block, nodes)?;
        let caret = ids.first().and_then(|id| self.caret_start(*id));
        Ok(Effect::new()
            .replaced(block, &ids)
            .removed([block])
            .with_caret(caret))
    }

    /// Sets the info string. An indented block becomes a backtick fence long
    /// enough that no payload line closes it.
    pub fn set_code_block_language(&mut self, block: NodeId, language: &str) -> EditResult<Effect> {
        let code = self.block(block)?.clone();
        let parts = CodeParts::of(&code)?;
        let language = language.trim();
        if language.contains('\n') {
            return Err(EditError::Precondition("language must be a single line"));
        }
        let mut info = parts.info.clone();
        let close = if info.fenced {
            parts.close.as_deref()
        } else {
            info = CodeBlockInfo {
                fenced: true,
                fence_char: CodeFence::BACKTICK,
                fence_len: CodeFence::MIN_FENCE,
                open_indent: 0,
                closed: true,
                ..info
            };
            while payload_closes(&info, parts.payload.as_deref()) {
                info.fence_len += 1;
            }
            None
        };
        if info.fence_char == CodeFence::BACKTICK && language.contains(CodeFence::BACKTICK) {
            return Err(EditError::Precondition("backtick fence info cannot contain a backtick"));
        }
        info.info = language.to_string();
        info.language = language.split_whitespace().next().map(str::to_string);
        let close = close.map(str::to_string);
        let body = self.rebuild_code(block, info, parts.payload.as_deref(), close.as_deref())?;
        let caret = Caret::at_end(body, parts.payload_len());
        Ok(Effect::new().current(block, block).with_caret(Some(caret)))
    }

    /// Backspace at the start of the leaf after a code block: the leaf's text
    /// becomes the payload's last line.
    pub(crate) fn absorb_into_code(&mut self, code: NodeId, leaf: NodeId) -> EditResult<Effect> {
        let block = self.block(code)?.clone();
        let parts = CodeParts::of(&block)?;
        let text = self.block(leaf).map(|b| leaf_text(&b.inlines))?;
        let (payload, at) = match (parts.payload.as_deref(), text.is_empty()) {
            (Some(p), true) => (p.to_string(), p.len()),
            (Some(p), false) => (format!("{p}\n{text}"), p.len() + 1),
            (None, _) => (text.clone(), 0),
        };
        let payload = (!payload.is_empty() || parts.payload.is_some()).then_some(payload);
        if parts.info.fenced && payload_closes(&parts.info, payload.as_deref()) {
            return Err(EditError::Precondition("text would close the fence"));
        }
        let body = self.rebuild_code(code, parts.info, payload.as_deref(), parts.close.as_deref())?;
        let gone = self.remove_leaf(leaf)?;
        Ok(Effect::new()
            .current(code, code)
            .removed(gone)
            .with_caret(Some(Caret::new(body, at))))
    }
}
