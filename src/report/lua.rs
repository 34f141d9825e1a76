// src/report/lua.rs
//! Lua report units.
//!
//! A unit is a Lua 5.4 file defining a global entry point:
//!
//! ```lua
//! function render(data, params)
//!     local people = data.employee or {}
//!     ui.title("Headcount", "Filtered workforce")
//!     ui.kpi("Employees", #people)
//!     ui.table({ "Name", "Band" }, { { people[1].employee_name, people[1].band } })
//! end
//! ```
//!
//! `data` maps dataset names to arrays of row tables. Null cells are absent
//! from the row table and dates arrive as `YYYY-MM-DD` strings. The `ui`
//! global offers `title`, `text`, `kpi`, `table`, `fields`, `warning` and
//! `error`.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use mlua::{Function, Lua, Table, Value as LuaValue};

use super::{Element, RecordingSurface, Report, ReportContext, ReportError, RenderSurface};
use crate::data::{Dataset, DatasetCollection, Value};

/// Name of the function every unit must define.
const ENTRY_POINT: &str = "render";

/// A report backed by a Lua file, loaded afresh on every render.
#[derive(Debug, Clone)]
pub struct ScriptReport {
    path: PathBuf,
}

type Staged = Rc<RefCell<RecordingSurface>>;

impl ScriptReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_name(&self) -> String {
        self.path.display().to_string()
    }

    fn lua_err(&self) -> impl Fn(mlua::Error) -> ReportError + '_ {
        move |e| ReportError::Lua {
            file: self.file_name(),
            message: e.to_string(),
        }
    }

    fn run(&self, source: &str, ctx: &ReportContext<'_>, staged: Staged) -> mlua::Result<bool> {
        let lua = Lua::new();
        register_ui(&lua, staged)?;

        lua.load(source).set_name(self.file_name()).exec()?;

        let entry: LuaValue = lua.globals().get(ENTRY_POINT)?;
        let LuaValue::Function(render) = entry else {
            return Ok(false);
        };

        let data = collection_to_lua(&lua, ctx.data)?;
        let params = lua.create_table_from(
            ctx.params
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        )?;
        call_entry(&render, data, params)?;
        Ok(true)
    }
}

fn call_entry(render: &Function, data: Table, params: Table) -> mlua::Result<()> {
    render.call::<()>((data, params))
}

impl Report for ScriptReport {
    fn render(
        &self,
        ctx: &ReportContext<'_>,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), ReportError> {
        let source = fs::read_to_string(&self.path).map_err(|source| ReportError::Io {
            path: self.path.clone(),
            source,
        })?;

        let staged: Staged = Rc::new(RefCell::new(RecordingSurface::new()));
        let found = self
            .run(&source, ctx, Rc::clone(&staged))
            .map_err(self.lua_err())?;
        if !found {
            return Err(ReportError::MissingEntryPoint {
                file: self.file_name(),
            });
        }

        // The interpreter is gone by now, so this is the only handle left.
        let staged = Rc::try_unwrap(staged)
            .map(RefCell::into_inner)
            .unwrap_or_else(|shared| shared.borrow().clone());
        staged.replay_into(surface);
        Ok(())
    }
}

fn register_ui(lua: &Lua, staged: Staged) -> mlua::Result<()> {
    let ui = lua.create_table()?;

    let emit = move |element: Element| staged.borrow_mut().emit(element);
    let emit = Rc::new(emit);

    let out = Rc::clone(&emit);
    ui.set(
        "title",
        lua.create_function(move |_, (title, subtitle): (String, Option<String>)| {
            out(Element::Title { title, subtitle });
            Ok(())
        })?,
    )?;

    let out = Rc::clone(&emit);
    ui.set(
        "text",
        lua.create_function(move |_, text: LuaValue| {
            out(Element::Text {
                text: display(&text),
            });
            Ok(())
        })?,
    )?;

    let out = Rc::clone(&emit);
    ui.set(
        "kpi",
        lua.create_function(move |_, (label, value): (String, LuaValue)| {
            out(Element::Kpi {
                label,
                value: display(&value),
            });
            Ok(())
        })?,
    )?;

    let out = Rc::clone(&emit);
    ui.set(
        "table",
        lua.create_function(move |_, (headers, rows): (Vec<String>, Vec<Table>)| {
            // Rows are read by header position: a nil cell must not end the row.
            let rows = rows
                .iter()
                .map(|row| {
                    (1..=headers.len())
                        .map(|i| row.raw_get::<LuaValue>(i).map(|cell| display(&cell)))
                        .collect::<mlua::Result<Vec<_>>>()
                })
                .collect::<mlua::Result<Vec<_>>>()?;
            out(Element::Table { headers, rows });
            Ok(())
        })?,
    )?;

    let out = Rc::clone(&emit);
    ui.set(
        "fields",
        lua.create_function(move |_, (title, pairs): (String, Vec<Vec<LuaValue>>)| {
            let fields = pairs
                .iter()
                .map(|pair| {
                    let label = pair.first().map(display).unwrap_or_default();
                    let value = pair.get(1).map(display).unwrap_or_else(|| "-".to_string());
                    (label, value)
                })
                .collect();
            out(Element::Fields { title, fields });
            Ok(())
        })?,
    )?;

    let out = Rc::clone(&emit);
    ui.set(
        "warning",
        lua.create_function(move |_, message: String| {
            out(Element::Warning { message });
            Ok(())
        })?,
    )?;

    let out = Rc::clone(&emit);
    ui.set(
        "error",
        lua.create_function(move |_, message: String| {
            out(Element::Error { message });
            Ok(())
        })?,
    )?;

    lua.globals().set("ui", ui)
}

/// Text form of a Lua value as a report would show it.
fn display(value: &LuaValue) -> String {
    match value {
        LuaValue::Nil => "-".to_string(),
        LuaValue::Boolean(b) => b.to_string(),
        LuaValue::Integer(i) => i.to_string(),
        LuaValue::Number(n) => Value::Number(*n).to_string(),
        LuaValue::String(s) => s.to_string_lossy().to_string(),
        other => other.type_name().to_string(),
    }
}

fn value_to_lua(lua: &Lua, value: &Value) -> mlua::Result<LuaValue> {
    Ok(match value {
        Value::Null => LuaValue::Nil,
        Value::Number(n) => LuaValue::Number(*n),
        Value::Date(d) => LuaValue::String(lua.create_string(d.format("%Y-%m-%d").to_string())?),
        Value::String(s) => LuaValue::String(lua.create_string(s)?),
    })
}

fn dataset_to_lua(lua: &Lua, dataset: &Dataset) -> mlua::Result<Table> {
    let rows = lua.create_table_with_capacity(dataset.len(), 0)?;
    for (i, record) in dataset.records().iter().enumerate() {
        let row = lua.create_table()?;
        for (column, value) in record.iter() {
            row.set(column, value_to_lua(lua, value)?)?;
        }
        rows.set(i + 1, row)?;
    }
    Ok(rows)
}

fn collection_to_lua(lua: &Lua, collection: &DatasetCollection) -> mlua::Result<Table> {
    let data = lua.create_table()?;
    for (name, dataset) in collection.iter() {
        data.set(name, dataset_to_lua(lua, dataset)?)?;
    }
    Ok(data)
}
