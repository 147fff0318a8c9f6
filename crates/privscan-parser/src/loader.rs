//! Turns parsed statements into functions with every collaborator result attached.
//!
//! Names are resolved in file order, so a statement may only refer to values, instructions,
//! alias nodes, estimate memories and loops declared above it.

use crate::errors::{ParseError, Result};
use crate::statement::{FactValue, Statement};
use privscan_core::{
    AliasNodeId, AliasNodeKind, AliasTreeBuilder, BlockId, DefinitionInfo, Dependence,
    DependenceKind, DfNodeId, Direction, Distance, EstimateId, Function, InstId, LocationSet,
    MemoryLocation, ModRef, Operation, RegionId, SourceLocation, Value, ValueId, ValueKind,
};
use std::collections::{BTreeSet, HashMap};

struct FunctionBuilder {
    function: Function,
    tree: Option<AliasTreeBuilder>,
    nodes: HashMap<String, AliasNodeId>,
    estimates: HashMap<String, EstimateId>,
    insts: HashMap<String, InstId>,
}

impl FunctionBuilder {
    fn new(name: &str) -> Self {
        Self {
            function: Function::new(name),
            tree: None,
            nodes: HashMap::new(),
            estimates: HashMap::new(),
            insts: HashMap::new(),
        }
    }

    fn finish(self) -> Function {
        let mut function = self.function;
        function.alias_tree = self.tree.map(AliasTreeBuilder::build);
        function
    }

    fn tree(&mut self) -> &mut AliasTreeBuilder {
        self.tree.get_or_insert_with(AliasTreeBuilder::new)
    }

    fn value(&self, stmt: &Statement, name: &str) -> Result<ValueId> {
        self.function
            .find_value(name)
            .ok_or_else(|| stmt.error(format!("unknown value {}", name)))
    }

    fn location(&self, stmt: &Statement, value: &FactValue) -> Result<MemoryLocation> {
        match value {
            FactValue::Location { name, size } => {
                Ok(MemoryLocation::new(self.value(stmt, name)?, *size))
            }
            other => Err(stmt.error(format!("expected a location, found {}", other))),
        }
    }

    fn locations(&self, stmt: &Statement, key: &str) -> Result<Vec<MemoryLocation>> {
        match stmt.attr(key) {
            Some(value) => value
                .items()
                .iter()
                .map(|item| self.location(stmt, item))
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    fn location_set(&self, stmt: &Statement, key: &str) -> Result<LocationSet> {
        let mut set = LocationSet::new();
        for loc in self.locations(stmt, key)? {
            set.insert(loc);
        }
        Ok(set)
    }

    fn inst(&self, stmt: &Statement, name: &str) -> Result<InstId> {
        self.insts
            .get(name)
            .copied()
            .ok_or_else(|| stmt.error(format!("unknown instruction {}", name)))
    }

    fn node(&mut self, stmt: &Statement, name: &str) -> Result<AliasNodeId> {
        if name == "top" {
            return Ok(self.tree().top());
        }
        self.nodes
            .get(name)
            .copied()
            .ok_or_else(|| stmt.error(format!("unknown alias node {}", name)))
    }

    fn region(&self, stmt: &Statement, name: &str) -> Result<RegionId> {
        self.function
            .regions
            .find(name)
            .ok_or_else(|| stmt.error(format!("unknown loop {}", name)))
    }
}

fn name_at<'s>(stmt: &'s Statement, index: usize, what: &str) -> Result<&'s str> {
    stmt.positional(index)
        .and_then(FactValue::as_name)
        .ok_or_else(|| stmt.error(format!("{} expects a {} name", stmt.keyword, what)))
}

fn number(stmt: &Statement, value: &FactValue, what: &str) -> Result<u64> {
    value
        .as_number()
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| stmt.error(format!("{} must be a non-negative number", what)))
}

fn number_attr(stmt: &Statement, key: &str) -> Result<u64> {
    let value = stmt
        .attr(key)
        .ok_or_else(|| stmt.error(format!("{} is missing {}=", stmt.keyword, key)))?;
    number(stmt, value, key)
}

fn id_attr(stmt: &Statement, key: &str) -> Result<u32> {
    u32::try_from(number_attr(stmt, key)?).map_err(|_| stmt.error(format!("{} is too large", key)))
}

fn core_error(stmt: &Statement) -> impl FnOnce(privscan_core::CoreError) -> ParseError {
    let line = stmt.line;
    move |source| ParseError::Core { line, source }
}

/// Builds one function per `function` statement.
#[derive(Default)]
pub struct FactsLoader {
    functions: Vec<Function>,
    current: Option<FunctionBuilder>,
}

impl FactsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(mut self, statements: &[Statement]) -> Result<Vec<Function>> {
        for stmt in statements {
            self.statement(stmt)?;
        }
        if let Some(builder) = self.current.take() {
            self.functions.push(builder.finish());
        }
        Ok(self.functions)
    }

    fn statement(&mut self, stmt: &Statement) -> Result<()> {
        if stmt.keyword == "function" {
            let name = name_at(stmt, 0, "function")?;
            if let Some(builder) = self.current.replace(FunctionBuilder::new(name)) {
                self.functions.push(builder.finish());
            }
            return Ok(());
        }
        let builder = self
            .current
            .as_mut()
            .ok_or_else(|| stmt.error(format!("{} outside of a function", stmt.keyword)))?;
        match stmt.keyword.as_str() {
            "value" => value(builder, stmt),
            "inst" => inst(builder, stmt),
            "alias" => alias(builder, stmt),
            "estimate" => estimate(builder, stmt),
            "unknown" => unknown(builder, stmt),
            "loop" => region(builder, stmt),
            "access" => access(builder, stmt),
            "live" => live(builder, stmt),
            "reach" => reach(builder, stmt),
            "dep" => dependence(builder, stmt),
            "modref" => mod_ref(builder, stmt),
            other => Err(stmt.error(format!("unknown statement {}", other))),
        }
    }
}

fn value(builder: &mut FunctionBuilder, stmt: &Statement) -> Result<()> {
    let name = name_at(stmt, 0, "value")?;
    if builder.function.find_value(name).is_some() {
        return Err(stmt.error(format!("value {} is declared twice", name)));
    }
    let kind = match name_at(stmt, 1, "kind")? {
        "alloca" => ValueKind::Alloca {
            block: BlockId(match stmt.attr("block") {
                Some(_) => id_attr(stmt, "block")?,
                None => 0,
            }),
        },
        "global" => ValueKind::Global,
        "argument" => ValueKind::Argument,
        "load" => {
            let from = stmt
                .attr("from")
                .ok_or_else(|| stmt.error("a loaded pointer needs from="))?;
            ValueKind::Load {
                location: builder.location(stmt, from)?,
            }
        }
        "call" => ValueKind::CallResult,
        "other" => ValueKind::Other,
        other => return Err(stmt.error(format!("unknown value kind {}", other))),
    };
    let mut value = Value::new(ValueId(0), name, kind);
    if let Some(source) = stmt.attr("source") {
        let FactValue::Str(text) = source else {
            return Err(stmt.error("source must be a quoted file:line:column"));
        };
        let source = SourceLocation::parse(text)
            .ok_or_else(|| stmt.error(format!("malformed source location {}", text)))?;
        value = value.with_source(source);
    }
    builder.function.push_value(value);
    Ok(())
}

fn inst(builder: &mut FunctionBuilder, stmt: &Statement) -> Result<()> {
    let label = name_at(stmt, 0, "instruction")?;
    if builder.insts.contains_key(label) {
        return Err(stmt.error(format!("instruction {} is declared twice", label)));
    }
    let block = BlockId(id_attr(stmt, "block")?);
    let operand = |index: usize| {
        stmt.positional(index)
            .ok_or_else(|| stmt.error(format!("{} is missing an operand", label)))
    };
    let op = match name_at(stmt, 1, "operation")? {
        "load" => Operation::Load {
            location: builder.location(stmt, operand(2)?)?,
        },
        "store" => Operation::Store {
            location: builder.location(stmt, operand(2)?)?,
            value: match stmt.attr("value").and_then(FactValue::as_name) {
                Some(name) => Some(builder.value(stmt, name)?),
                None => None,
            },
        },
        "call" => Operation::Call {
            callee: name_at(stmt, 2, "callee")?.to_string(),
            reads_only: stmt.has_flag("readonly"),
            accesses: builder.locations(stmt, "accesses")?,
        },
        "opaque" => Operation::Opaque {
            reads_only: stmt.has_flag("readonly"),
            accesses: builder.locations(stmt, "accesses")?,
        },
        "ptrtoint" => Operation::PtrToInt {
            operand: builder.value(stmt, name_at(stmt, 2, "operand")?)?,
        },
        "addressof" => Operation::AddressOf {
            base: builder.value(stmt, name_at(stmt, 2, "base")?)?,
        },
        "other" => Operation::Other,
        other => return Err(stmt.error(format!("unknown operation {}", other))),
    };
    let id = builder.function.add_instruction(block, op);
    builder.insts.insert(label.to_string(), id);
    Ok(())
}

fn alias(builder: &mut FunctionBuilder, stmt: &Statement) -> Result<()> {
    let label = name_at(stmt, 0, "alias node")?;
    if label == "top" || builder.nodes.contains_key(label) {
        return Err(stmt.error(format!("alias node {} is declared twice", label)));
    }
    let parent = match stmt.attr("parent").and_then(FactValue::as_name) {
        Some(parent) => builder.node(stmt, parent)?,
        None => builder.tree().top(),
    };
    let kind = match stmt.attr("kind").and_then(FactValue::as_name) {
        None | Some("estimate") => AliasNodeKind::Estimate,
        Some("unknown") => AliasNodeKind::Unknown,
        Some(other) => return Err(stmt.error(format!("unknown alias node kind {}", other))),
    };
    let id = builder
        .tree()
        .add_node(parent, kind)
        .map_err(core_error(stmt))?;
    builder.nodes.insert(label.to_string(), id);
    Ok(())
}

fn estimate(builder: &mut FunctionBuilder, stmt: &Statement) -> Result<()> {
    let label = name_at(stmt, 0, "estimate memory")?;
    if builder.estimates.contains_key(label) {
        return Err(stmt.error(format!("estimate memory {} is declared twice", label)));
    }
    let node_name = stmt
        .attr("node")
        .and_then(FactValue::as_name)
        .ok_or_else(|| stmt.error("estimate is missing node="))?;
    let node = builder.node(stmt, node_name)?;
    let pointers = stmt
        .attr("ptrs")
        .ok_or_else(|| stmt.error("estimate is missing ptrs="))?
        .items()
        .iter()
        .map(|item| {
            item.as_name()
                .ok_or_else(|| stmt.error(format!("{} is not a pointer name", item)))
                .and_then(|name| builder.value(stmt, name))
        })
        .collect::<Result<Vec<_>>>()?;
    let size = match stmt.attr("size") {
        None | Some(FactValue::Unknown) => None,
        Some(value) => Some(number(stmt, value, "size")?),
    };
    let offset = match stmt.attr("offset") {
        Some(value) => number(stmt, value, "offset")?,
        None => 0,
    };
    let parent = match stmt.attr("parent").and_then(FactValue::as_name) {
        Some(parent) => Some(
            builder
                .estimates
                .get(parent)
                .copied()
                .ok_or_else(|| stmt.error(format!("unknown estimate memory {}", parent)))?,
        ),
        None => None,
    };
    let id = builder
        .tree()
        .add_estimate(node, pointers, size, offset, parent)
        .map_err(core_error(stmt))?;
    builder.estimates.insert(label.to_string(), id);
    Ok(())
}

fn unknown(builder: &mut FunctionBuilder, stmt: &Statement) -> Result<()> {
    let inst = builder.inst(stmt, name_at(stmt, 0, "instruction")?)?;
    let node = builder.node(stmt, name_at(stmt, 1, "alias node")?)?;
    builder
        .tree()
        .add_unknown(node, inst)
        .map_err(core_error(stmt))
}

fn region(builder: &mut FunctionBuilder, stmt: &Statement) -> Result<()> {
    let name = name_at(stmt, 0, "loop")?;
    let parent = match stmt.attr("parent").and_then(FactValue::as_name) {
        Some(parent) => Some(builder.region(stmt, parent)?),
        None => None,
    };
    let blocks = stmt
        .attr("blocks")
        .ok_or_else(|| stmt.error("loop is missing blocks="))?
        .items()
        .iter()
        .map(|item| {
            number(stmt, item, "block")
                .and_then(|n| u32::try_from(n).map_err(|_| stmt.error("block is too large")))
                .map(BlockId)
        })
        .collect::<Result<BTreeSet<_>>>()?;
    let start = match stmt.attr("start") {
        Some(FactValue::Str(text)) => Some(
            SourceLocation::parse(text)
                .ok_or_else(|| stmt.error(format!("malformed source location {}", text)))?,
        ),
        Some(_) => return Err(stmt.error("start must be a quoted file:line:column")),
        None => None,
    };
    builder
        .function
        .regions
        .add_loop(
            name,
            parent,
            BlockId(id_attr(stmt, "header")?),
            blocks,
            DfNodeId(id_attr(stmt, "latch")?),
            DfNodeId(id_attr(stmt, "exit")?),
            start,
        )
        .map_err(core_error(stmt))?;
    Ok(())
}

fn access(builder: &mut FunctionBuilder, stmt: &Statement) -> Result<()> {
    let region = builder.region(stmt, name_at(stmt, 0, "loop")?)?;
    let explicit = builder.locations(stmt, "explicit")?;
    let uses = builder.locations(stmt, "use")?;
    let defs = builder.locations(stmt, "def")?;
    let may_defs = builder.locations(stmt, "maydef")?;
    let unknowns = match stmt.attr("unknowns") {
        Some(value) => value
            .items()
            .iter()
            .map(|item| {
                item.as_name()
                    .ok_or_else(|| stmt.error(format!("{} is not an instruction", item)))
                    .and_then(|name| builder.inst(stmt, name))
            })
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    let addresses = match stmt.attr("address") {
        Some(value) => value
            .items()
            .iter()
            .map(|item| {
                item.as_name()
                    .ok_or_else(|| stmt.error(format!("{} is not a value", item)))
                    .and_then(|name| builder.value(stmt, name))
            })
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    let def_use = builder.function.def_use_mut(region);
    explicit.into_iter().for_each(|loc| def_use.add_explicit_access(loc));
    uses.into_iter().for_each(|loc| def_use.add_use(loc));
    defs.into_iter().for_each(|loc| def_use.add_def(loc));
    may_defs.into_iter().for_each(|loc| def_use.add_may_def(loc));
    unknowns.into_iter().for_each(|inst| def_use.add_explicit_unknown(inst));
    addresses.into_iter().for_each(|ptr| def_use.add_address_access(ptr));
    Ok(())
}

fn live(builder: &mut FunctionBuilder, stmt: &Statement) -> Result<()> {
    let region = builder.region(stmt, name_at(stmt, 0, "loop")?)?;
    let locations = match stmt.positional(1) {
        Some(value) => value
            .items()
            .iter()
            .map(|item| builder.location(stmt, item))
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    let live = builder.function.live_mut(region);
    for loc in locations {
        live.out.insert(loc);
    }
    Ok(())
}

/// `may` always includes `must`.
fn reach(builder: &mut FunctionBuilder, stmt: &Statement) -> Result<()> {
    let node = stmt
        .positional(0)
        .ok_or_else(|| stmt.error("reach expects a data-flow node"))
        .and_then(|value| number(stmt, value, "data-flow node"))
        .and_then(|n| u32::try_from(n).map_err(|_| stmt.error("data-flow node is too large")))?;
    let must = builder.location_set(stmt, "must")?;
    let mut may = builder.location_set(stmt, "may")?;
    for loc in must.iter() {
        may.insert(*loc);
    }
    builder
        .function
        .set_reach(DfNodeId(node), DefinitionInfo::new(must, may));
    Ok(())
}

fn dependence(builder: &mut FunctionBuilder, stmt: &Statement) -> Result<()> {
    let src = builder.inst(stmt, name_at(stmt, 0, "source instruction")?)?;
    let dst = builder.inst(stmt, name_at(stmt, 1, "destination instruction")?)?;
    let kind = match name_at(stmt, 2, "dependence kind")? {
        "flow" => DependenceKind::Flow,
        "anti" => DependenceKind::Anti,
        "output" => DependenceKind::Output,
        "input" => DependenceKind::Input,
        other => return Err(stmt.error(format!("unknown dependence kind {}", other))),
    };
    let directions = match stmt.attr("dirs") {
        Some(value) => value
            .items()
            .iter()
            .map(|item| {
                item.as_name()
                    .and_then(Direction::from_str)
                    .ok_or_else(|| stmt.error(format!("unknown direction {}", item)))
            })
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    let mut dep = Dependence::new(kind, directions);
    if let Some(value) = stmt.attr("dists") {
        let distances = value
            .items()
            .iter()
            .map(|item| match item {
                FactValue::Number(n) => Ok(Some(Distance::Constant(*n))),
                FactValue::Name(expr) => Ok(Some(Distance::Symbolic(expr.clone()))),
                FactValue::Unknown => Ok(None),
                other => Err(stmt.error(format!("unknown distance {}", other))),
            })
            .collect::<Result<Vec<_>>>()?;
        dep = dep.with_distances(distances);
    }
    builder.function.dependences.insert_dependence(src, dst, dep);
    Ok(())
}

fn mod_ref(builder: &mut FunctionBuilder, stmt: &Statement) -> Result<()> {
    let inst = builder.inst(stmt, name_at(stmt, 0, "instruction")?)?;
    let loc = builder.location(
        stmt,
        stmt.positional(1)
            .ok_or_else(|| stmt.error("modref expects a location"))?,
    )?;
    let info = name_at(stmt, 2, "mod/ref kind")
        .and_then(|kind| {
            ModRef::from_str(kind).ok_or_else(|| stmt.error(format!("unknown mod/ref kind {}", kind)))
        })?;
    builder.function.dependences.insert_mod_ref(inst, loc, info);
    Ok(())
}
