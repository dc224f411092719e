//! Built-in host operations.

use super::{Category, JsonType, Operation, Preprocess};
use crate::attention::Scope;

/// Every operation the host's UI subsystem understands, plus local ones.
pub fn operations() -> Vec<Operation> {
    let mut ops = Vec::new();
    ops.extend(context());
    ops.extend(introspection());
    ops.extend(structure());
    ops.extend(bulk());
    ops.extend(timeline());
    ops.extend(material());
    ops.extend(blueprint());
    ops.extend(editor());
    ops
}

fn context() -> Vec<Operation> {
    use Category::Context;
    vec![
        Operation::write(
            "set_target_umg_asset",
            Context,
            "Set the widget document that later operations act on.",
        )
        .param("asset_path", JsonType::String, "Asset path, e.g. /Game/UI/WBP_Main")
        .selects(Scope::Asset, "asset_path"),
        Operation::read(
            "get_target_umg_asset",
            Context,
            "Get the widget document the host currently targets.",
        ),
        Operation::read(
            "get_last_edited_umg_asset",
            Context,
            "Get the widget document most recently edited in the host.",
        ),
        Operation::read(
            "get_recently_edited_umg_assets",
            Context,
            "List recently edited widget documents, newest first.",
        )
        .optional("max_count", JsonType::Integer, "Maximum entries (default 5)"),
    ]
}

fn introspection() -> Vec<Operation> {
    use Category::Introspection;
    vec![
        Operation::read(
            "get_widget_schema",
            Introspection,
            "Describe the editable properties of a widget class.",
        )
        .param("widget_type", JsonType::String, "Widget class name"),
        Operation::read(
            "get_creatable_widget_types",
            Introspection,
            "List every widget class that can be created.",
        ),
    ]
}

fn structure() -> Vec<Operation> {
    use Category::{StructureRead, StructureWrite};
    vec![
        Operation::read(
            "get_widget_tree",
            StructureRead,
            "Get the full widget hierarchy of the target document.",
        )
        .injects(Scope::Asset),
        Operation::read(
            "query_widget_properties",
            StructureRead,
            "Read selected properties of one widget.",
        )
        .param("widget_name", JsonType::String, "Widget to query")
        .param("properties", JsonType::Array, "Property names")
        .injects(Scope::Asset),
        Operation::read(
            "get_layout_data",
            StructureRead,
            "Get screen-space bounding boxes of all widgets at a resolution.",
        )
        .optional(
            "resolution",
            JsonType::Object,
            "{\"width\": .., \"height\": ..}, default 1920x1080",
        )
        .injects(Scope::Asset),
        Operation::read(
            "check_widget_overlap",
            StructureRead,
            "Report overlapping widgets.",
        )
        .optional("widget_names", JsonType::Array, "Restrict the check to these widgets")
        .injects(Scope::Asset),
        Operation::write(
            "create_widget",
            StructureWrite,
            "Create a widget and attach it to a parent.",
        )
        .param("widget_type", JsonType::String, "Widget class name")
        .param("new_widget_name", JsonType::String, "Name of the new widget")
        .optional("parent_name", JsonType::String, "Parent widget; root when empty")
        .optional("properties", JsonType::Object, "Initial property values")
        .injects(Scope::Asset),
        Operation::write(
            "set_widget_properties",
            StructureWrite,
            "Set one or more properties on a widget.",
        )
        .param("widget_name", JsonType::String, "Widget to modify")
        .param("properties", JsonType::Object, "Property values; slot values under \"Slot\"")
        .injects(Scope::Asset),
        Operation::write("delete_widget", StructureWrite, "Delete a widget.")
            .param("widget_name", JsonType::String, "Widget to delete")
            .injects(Scope::Asset),
        Operation::write(
            "reparent_widget",
            StructureWrite,
            "Move a widget under a different parent.",
        )
        .param("widget_name", JsonType::String, "Widget to move")
        .param("new_parent_name", JsonType::String, "New parent widget")
        .injects(Scope::Asset),
        Operation::write("save_asset", StructureWrite, "Save the target document.")
            .injects(Scope::Asset),
    ]
}

fn bulk() -> Vec<Operation> {
    use Category::Bulk;
    vec![
        Operation::read(
            "export_umg_to_json",
            Bulk,
            "Export the target document (or one subtree) as a widget document.",
        )
        .optional("widget_name", JsonType::String, "Subtree root (default Root)")
        .injects(Scope::Asset),
        Operation::write(
            "apply_json_to_umg",
            Bulk,
            "Replace the target document (or one subtree) from a widget document.",
        )
        .param("json_data", JsonType::ObjectOrString, "Widget document")
        .optional("widget_name", JsonType::String, "Subtree to replace (default Root)")
        .injects(Scope::Asset)
        .preprocess(Preprocess::Document("json_data".into())),
        Operation::write(
            "apply_markup",
            Bulk,
            "Build the target document (or one subtree) from tag markup such as \
             <CanvasPanel><Button Name=\"Ok\" Slot.Position=\"[10,10]\"/></CanvasPanel>.",
        )
        .param("markup", JsonType::String, "Tag markup with a single root element")
        .optional("widget_name", JsonType::String, "Subtree to replace (default Root)")
        .injects(Scope::Asset)
        .preprocess(Preprocess::Markup("markup".into()))
        .sends_as("apply_json_to_umg"),
    ]
}

fn timeline() -> Vec<Operation> {
    use Category::Timeline;
    vec![
        Operation::write(
            "set_animation_scope",
            Timeline,
            "Select the animation that keyframe operations act on.",
        )
        .param("animation_name", JsonType::String, "Animation name")
        .selects(Scope::Animation, "animation_name"),
        Operation::write(
            "set_widget_scope",
            Timeline,
            "Select the widget whose tracks keyframe operations act on.",
        )
        .param("widget_name", JsonType::String, "Widget name")
        .selects(Scope::Widget, "widget_name"),
        Operation::read(
            "get_all_animations",
            Timeline,
            "List the animations of the target document.",
        )
        .injects(Scope::Asset),
        Operation::read(
            "get_animation_keyframes",
            Timeline,
            "Get all keyframes of an animation.",
        )
        .injects(Scope::Asset)
        .injects(Scope::Animation),
        Operation::read(
            "get_animated_widgets",
            Timeline,
            "List the widgets an animation has tracks for.",
        )
        .injects(Scope::Asset)
        .injects(Scope::Animation),
        Operation::read(
            "get_animation_full_data",
            Timeline,
            "Get every track and key of an animation.",
        )
        .injects(Scope::Asset)
        .injects(Scope::Animation),
        Operation::read(
            "get_widget_animation_data",
            Timeline,
            "Get the tracks of one widget in one animation.",
        )
        .injects(Scope::Asset)
        .injects(Scope::Animation)
        .injects(Scope::Widget),
        Operation::write(
            "create_animation",
            Timeline,
            "Create an animation in the target document.",
        )
        .param("animation_name", JsonType::String, "Animation name")
        .injects(Scope::Asset),
        Operation::write(
            "delete_animation",
            Timeline,
            "Delete an animation from the target document.",
        )
        .param("animation_name", JsonType::String, "Animation name")
        .injects(Scope::Asset),
        Operation::write(
            "set_property_keys",
            Timeline,
            "Write keys for one property of the scoped widget in the scoped animation.",
        )
        .param("property_name", JsonType::String, "e.g. RenderOpacity")
        .param("keys", JsonType::Array, "[{\"time\": .., \"value\": ..}, ..]")
        .injects(Scope::Asset)
        .injects_if_known(Scope::Animation)
        .injects_if_known(Scope::Widget),
        Operation::write(
            "remove_property_track",
            Timeline,
            "Remove the track of one property of the scoped widget.",
        )
        .param("property_name", JsonType::String, "Property whose track is removed")
        .injects(Scope::Asset)
        .injects_if_known(Scope::Animation)
        .injects_if_known(Scope::Widget),
        Operation::write(
            "remove_keys",
            Timeline,
            "Remove keys at the given times from one property track.",
        )
        .param("property_name", JsonType::String, "Property track")
        .param("times", JsonType::Array, "Key times in seconds")
        .injects(Scope::Asset)
        .injects_if_known(Scope::Animation)
        .injects_if_known(Scope::Widget),
    ]
}

fn material() -> Vec<Operation> {
    use Category::Material;
    vec![
        Operation::write(
            "material_set_target",
            Material,
            "Select (creating if needed) the material graph to edit.",
        )
        .param("path", JsonType::String, "Material asset path")
        .selects(Scope::Material, "path"),
        Operation::read(
            "material_get_graph",
            Material,
            "Get the nodes and connections of the target material.",
        )
        .guarded_by(Scope::Material),
        Operation::write(
            "material_add_node",
            Material,
            "Add an expression node to the target material.",
        )
        .param("symbol", JsonType::String, "Node type symbol")
        .optional("handle", JsonType::String, "Handle to refer to the node later")
        .guarded_by(Scope::Material),
        Operation::write(
            "material_connect_nodes",
            Material,
            "Connect the output of one node to another.",
        )
        .param("from", JsonType::String, "Source node handle")
        .param("to", JsonType::String, "Target node handle or Master pin")
        .guarded_by(Scope::Material),
        Operation::write(
            "material_delete",
            Material,
            "Delete a node from the target material.",
        )
        .param("handle", JsonType::String, "Node handle")
        .guarded_by(Scope::Material),
        Operation::write(
            "material_compile_asset",
            Material,
            "Compile and save the target material.",
        )
        .guarded_by(Scope::Material),
    ]
}

fn blueprint() -> Vec<Operation> {
    use Category::Blueprint;
    vec![
        Operation::write("create_blueprint", Blueprint, "Create an actor blueprint.")
            .param("name", JsonType::String, "Blueprint name")
            .optional("parent_class", JsonType::String, "Parent class (default AActor)"),
        Operation::write(
            "add_component_to_blueprint",
            Blueprint,
            "Add a component to a blueprint.",
        )
        .param("blueprint_name", JsonType::String, "Blueprint to modify")
        .param("component_type", JsonType::String, "Component class, e.g. StaticMesh")
        .param("component_name", JsonType::String, "Name of the new component")
        .optional("location", JsonType::Array, "[x, y, z]")
        .optional("rotation", JsonType::Array, "[pitch, yaw, roll]")
        .optional("scale", JsonType::Array, "[x, y, z]"),
        Operation::write(
            "set_physics_properties",
            Blueprint,
            "Set physics properties of a blueprint component.",
        )
        .param("blueprint_name", JsonType::String, "Blueprint to modify")
        .param("component_name", JsonType::String, "Component to modify")
        .optional("simulate_physics", JsonType::Boolean, "Enable physics simulation")
        .optional("mass", JsonType::Number, "Mass in kg")
        .optional("linear_damping", JsonType::Number, "Linear damping")
        .optional("angular_damping", JsonType::Number, "Angular damping"),
        Operation::write("compile_blueprint", Blueprint, "Compile a blueprint.")
            .param("blueprint_name", JsonType::String, "Blueprint to compile"),
        Operation::write(
            "set_static_mesh_properties",
            Blueprint,
            "Set the mesh and material of a static mesh component.",
        )
        .param("blueprint_name", JsonType::String, "Blueprint to modify")
        .param("component_name", JsonType::String, "Static mesh component")
        .optional("static_mesh", JsonType::String, "Mesh asset path")
        .optional("material", JsonType::String, "Material asset path"),
        Operation::write(
            "spawn_blueprint_actor",
            Blueprint,
            "Spawn an actor from a blueprint into the level.",
        )
        .param("blueprint_name", JsonType::String, "Blueprint to spawn")
        .param("actor_name", JsonType::String, "Name of the new actor")
        .optional("location", JsonType::Array, "[x, y, z]")
        .optional("rotation", JsonType::Array, "[pitch, yaw, roll]"),
        Operation::write(
            "set_mesh_material_color",
            Blueprint,
            "Set a color parameter on a component's material.",
        )
        .param("blueprint_name", JsonType::String, "Blueprint to modify")
        .param("component_name", JsonType::String, "Mesh component")
        .param("color", JsonType::Array, "[r, g, b, a] in 0..1")
        .optional("material_slot", JsonType::Integer, "Material slot (default 0)")
        .optional("parameter_name", JsonType::String, "Parameter (default BaseColor)")
        .optional("material_path", JsonType::String, "Material to use"),
        Operation::read(
            "get_available_materials",
            Blueprint,
            "List material assets the host can apply.",
        )
        .optional("search_path", JsonType::String, "Restrict to this content path")
        .optional(
            "include_engine_materials",
            JsonType::Boolean,
            "Include engine materials (default true)",
        ),
        Operation::write(
            "apply_material_to_actor",
            Blueprint,
            "Apply a material to an actor in the level.",
        )
        .param("actor_name", JsonType::String, "Actor to modify")
        .param("material_path", JsonType::String, "Material asset path")
        .optional("slot_index", JsonType::Integer, "Material slot (default 0)"),
        Operation::write(
            "apply_material_to_blueprint",
            Blueprint,
            "Apply a material to a blueprint component.",
        )
        .param("blueprint_name", JsonType::String, "Blueprint to modify")
        .param("component_name", JsonType::String, "Mesh component")
        .param("material_path", JsonType::String, "Material asset path")
        .optional("slot_index", JsonType::Integer, "Material slot (default 0)"),
        Operation::read(
            "get_actor_material_info",
            Blueprint,
            "Get the materials applied to an actor.",
        )
        .param("actor_name", JsonType::String, "Actor to inspect"),
    ]
}

fn editor() -> Vec<Operation> {
    use Category::Editor;
    vec![
        Operation::read("ping", Editor, "Check that the host bridge is listening."),
        Operation::read("get_actors_in_level", Editor, "List the actors in the open level."),
        Operation::read(
            "find_actors_by_name",
            Editor,
            "Find actors whose names match a pattern.",
        )
        .param("pattern", JsonType::String, "Name pattern"),
        Operation::write("spawn_actor", Editor, "Spawn an actor into the level.")
            .param("type", JsonType::String, "Actor class, e.g. StaticMeshActor")
            .param("name", JsonType::String, "Name of the new actor")
            .optional("location", JsonType::Array, "[x, y, z]")
            .optional("rotation", JsonType::Array, "[pitch, yaw, roll]")
            .optional("scale", JsonType::Array, "[x, y, z]")
            .optional("static_mesh", JsonType::String, "Mesh asset path"),
        Operation::write("delete_actor", Editor, "Delete an actor from the level.")
            .param("name", JsonType::String, "Actor to delete"),
        Operation::write(
            "set_actor_transform",
            Editor,
            "Move, rotate or scale an actor.",
        )
        .param("name", JsonType::String, "Actor to modify")
        .optional("location", JsonType::Array, "[x, y, z]")
        .optional("rotation", JsonType::Array, "[pitch, yaw, roll]")
        .optional("scale", JsonType::Array, "[x, y, z]"),
        Operation::write(
            "refresh_asset_registry",
            Editor,
            "Rescan content paths so new assets become visible.",
        )
        .optional("paths", JsonType::Array, "Content paths (default all)"),
    ]
}
