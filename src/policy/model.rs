// Typed view over one profile document. Every section is optional:
// an absent section inherits nothing from this document, and unknown
// keys are carried opaquely so merging never drops operator extensions.
use super::value::{Value, ValueMap};

/// System profile imports spliced verbatim into the compiled output
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportsSection {
    pub system_profiles: Vec<String>,
    pub extra: ValueMap,
}

/// Network access flags
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NetworkSection {
    pub enabled: Option<bool>,
    pub allow_localhost: Option<bool>,
    pub extra: ValueMap,
}

/// One direction of filesystem access: literal paths plus raw patterns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FsAccessSection {
    pub paths: Vec<String>,
    pub patterns: Vec<String>,
    pub extra: ValueMap,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilesystemSection {
    pub default_deny: Option<bool>,
    pub read: Option<FsAccessSection>,
    pub write: Option<FsAccessSection>,
    pub extra: ValueMap,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessSection {
    pub allow_exec: Option<bool>,
    pub allow_fork: Option<bool>,
    pub extra: ValueMap,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SystemSection {
    pub allow_user_preferences: Option<bool>,
    pub allow_sysctl_write: Option<bool>,
    pub allow_system_debug: Option<bool>,
    pub allow_mach_priv_task_port: Option<bool>,
    pub extra: ValueMap,
}

/// Mach service lookups: exact global names and name patterns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MachSection {
    pub lookup: Vec<String>,
    pub lookup_pattern: Vec<String>,
    pub extra: ValueMap,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IpcSection {
    pub allow_posix_shm: Option<bool>,
    pub posix_shm_names: Vec<String>,
    pub allow_posix_sem: Option<bool>,
    pub extra: ValueMap,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignalSection {
    pub target: Option<String>,
    pub extra: ValueMap,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IokitSection {
    pub open: Vec<String>,
    pub extra: ValueMap,
}

/// One loaded profile document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolicyDocument {
    pub imports: Option<ImportsSection>,
    pub network: Option<NetworkSection>,
    pub filesystem: Option<FilesystemSection>,
    pub process: Option<ProcessSection>,
    pub system: Option<SystemSection>,
    pub mach: Option<MachSection>,
    pub ipc: Option<IpcSection>,
    pub signal: Option<SignalSection>,
    pub iokit: Option<IokitSection>,
    pub extra: ValueMap,
}

/// The merged result of a document list plus overrides. Same shape as a
/// single document; built fresh per invocation and never mutated after
/// compilation starts.
pub type EffectivePolicy = PolicyDocument;

// Field extraction is lenient by design: a known key holding an
// unexpected type is kept verbatim in `extra` instead of failing, so a
// later document or override can still replace it under last-wins rules.

fn take_bool(map: &mut ValueMap, key: &str, extra: &mut ValueMap) -> Option<bool> {
    match map.remove(key) {
        Some(Value::Bool(b)) => Some(b),
        Some(other) => {
            extra.insert(key.to_string(), other);
            None
        }
        None => None,
    }
}

fn take_string(map: &mut ValueMap, key: &str, extra: &mut ValueMap) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(s)) => Some(s),
        Some(Value::Null) | None => None,
        Some(other) => {
            extra.insert(key.to_string(), other);
            None
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn take_string_list(map: &mut ValueMap, key: &str, extra: &mut ValueMap) -> Vec<String> {
    match map.remove(key) {
        Some(Value::List(items)) => items.iter().filter_map(scalar_to_string).collect(),
        Some(other) => {
            extra.insert(key.to_string(), other);
            Vec::new()
        }
        None => Vec::new(),
    }
}

fn take_section<T>(
    map: &mut ValueMap,
    key: &str,
    extra: &mut ValueMap,
    build: impl FnOnce(ValueMap) -> T,
) -> Option<T> {
    match map.remove(key) {
        Some(Value::Map(section)) => Some(build(section)),
        Some(other) => {
            extra.insert(key.to_string(), other);
            None
        }
        None => None,
    }
}

fn put_bool(map: &mut ValueMap, key: &str, field: Option<bool>) {
    if let Some(b) = field {
        map.insert(key.to_string(), Value::Bool(b));
    }
}

fn put_string_list(map: &mut ValueMap, key: &str, items: &[String]) {
    if !items.is_empty() {
        map.insert(
            key.to_string(),
            Value::List(items.iter().cloned().map(Value::String).collect()),
        );
    }
}

impl ImportsSection {
    fn from_map(mut map: ValueMap) -> Self {
        let mut extra = ValueMap::new();
        let system_profiles = take_string_list(&mut map, "system_profiles", &mut extra);
        extra.extend(map);
        Self {
            system_profiles,
            extra,
        }
    }

    fn to_map(&self) -> ValueMap {
        let mut map = self.extra.clone();
        put_string_list(&mut map, "system_profiles", &self.system_profiles);
        map
    }
}

impl NetworkSection {
    fn from_map(mut map: ValueMap) -> Self {
        let mut extra = ValueMap::new();
        let enabled = take_bool(&mut map, "enabled", &mut extra);
        let allow_localhost = take_bool(&mut map, "allow_localhost", &mut extra);
        extra.extend(map);
        Self {
            enabled,
            allow_localhost,
            extra,
        }
    }

    fn to_map(&self) -> ValueMap {
        let mut map = self.extra.clone();
        put_bool(&mut map, "enabled", self.enabled);
        put_bool(&mut map, "allow_localhost", self.allow_localhost);
        map
    }
}

impl FsAccessSection {
    fn from_map(mut map: ValueMap) -> Self {
        let mut extra = ValueMap::new();
        let paths = take_string_list(&mut map, "paths", &mut extra);
        let patterns = take_string_list(&mut map, "patterns", &mut extra);
        extra.extend(map);
        Self {
            paths,
            patterns,
            extra,
        }
    }

    fn to_map(&self) -> ValueMap {
        let mut map = self.extra.clone();
        put_string_list(&mut map, "paths", &self.paths);
        put_string_list(&mut map, "patterns", &self.patterns);
        map
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.patterns.is_empty()
    }
}

impl FilesystemSection {
    fn from_map(mut map: ValueMap) -> Self {
        let mut extra = ValueMap::new();
        let default_deny = take_bool(&mut map, "default_deny", &mut extra);
        let read = take_section(&mut map, "read", &mut extra, FsAccessSection::from_map);
        let write = take_section(&mut map, "write", &mut extra, FsAccessSection::from_map);
        extra.extend(map);
        Self {
            default_deny,
            read,
            write,
            extra,
        }
    }

    fn to_map(&self) -> ValueMap {
        let mut map = self.extra.clone();
        put_bool(&mut map, "default_deny", self.default_deny);
        if let Some(read) = &self.read {
            map.insert("read".to_string(), Value::Map(read.to_map()));
        }
        if let Some(write) = &self.write {
            map.insert("write".to_string(), Value::Map(write.to_map()));
        }
        map
    }
}

impl ProcessSection {
    fn from_map(mut map: ValueMap) -> Self {
        let mut extra = ValueMap::new();
        let allow_exec = take_bool(&mut map, "allow_exec", &mut extra);
        let allow_fork = take_bool(&mut map, "allow_fork", &mut extra);
        extra.extend(map);
        Self {
            allow_exec,
            allow_fork,
            extra,
        }
    }

    fn to_map(&self) -> ValueMap {
        let mut map = self.extra.clone();
        put_bool(&mut map, "allow_exec", self.allow_exec);
        put_bool(&mut map, "allow_fork", self.allow_fork);
        map
    }
}

impl SystemSection {
    fn from_map(mut map: ValueMap) -> Self {
        let mut extra = ValueMap::new();
        let allow_user_preferences = take_bool(&mut map, "allow_user_preferences", &mut extra);
        let allow_sysctl_write = take_bool(&mut map, "allow_sysctl_write", &mut extra);
        let allow_system_debug = take_bool(&mut map, "allow_system_debug", &mut extra);
        let allow_mach_priv_task_port = take_bool(&mut map, "allow_mach_priv_task_port", &mut extra);
        extra.extend(map);
        Self {
            allow_user_preferences,
            allow_sysctl_write,
            allow_system_debug,
            allow_mach_priv_task_port,
            extra,
        }
    }

    fn to_map(&self) -> ValueMap {
        let mut map = self.extra.clone();
        put_bool(&mut map, "allow_user_preferences", self.allow_user_preferences);
        put_bool(&mut map, "allow_sysctl_write", self.allow_sysctl_write);
        put_bool(&mut map, "allow_system_debug", self.allow_system_debug);
        put_bool(
            &mut map,
            "allow_mach_priv_task_port",
            self.allow_mach_priv_task_port,
        );
        map
    }
}

impl MachSection {
    fn from_map(mut map: ValueMap) -> Self {
        let mut extra = ValueMap::new();
        let lookup = take_string_list(&mut map, "lookup", &mut extra);
        let lookup_pattern = take_string_list(&mut map, "lookup_pattern", &mut extra);
        extra.extend(map);
        Self {
            lookup,
            lookup_pattern,
            extra,
        }
    }

    fn to_map(&self) -> ValueMap {
        let mut map = self.extra.clone();
        put_string_list(&mut map, "lookup", &self.lookup);
        put_string_list(&mut map, "lookup_pattern", &self.lookup_pattern);
        map
    }
}

impl IpcSection {
    fn from_map(mut map: ValueMap) -> Self {
        let mut extra = ValueMap::new();
        let allow_posix_shm = take_bool(&mut map, "allow_posix_shm", &mut extra);
        let posix_shm_names = take_string_list(&mut map, "posix_shm_names", &mut extra);
        let allow_posix_sem = take_bool(&mut map, "allow_posix_sem", &mut extra);
        extra.extend(map);
        Self {
            allow_posix_shm,
            posix_shm_names,
            allow_posix_sem,
            extra,
        }
    }

    fn to_map(&self) -> ValueMap {
        let mut map = self.extra.clone();
        put_bool(&mut map, "allow_posix_shm", self.allow_posix_shm);
        put_string_list(&mut map, "posix_shm_names", &self.posix_shm_names);
        put_bool(&mut map, "allow_posix_sem", self.allow_posix_sem);
        map
    }
}

impl SignalSection {
    fn from_map(mut map: ValueMap) -> Self {
        let mut extra = ValueMap::new();
        let target = take_string(&mut map, "target", &mut extra);
        extra.extend(map);
        Self { target, extra }
    }

    fn to_map(&self) -> ValueMap {
        let mut map = self.extra.clone();
        if let Some(target) = &self.target {
            map.insert("target".to_string(), Value::String(target.clone()));
        }
        map
    }
}

impl IokitSection {
    fn from_map(mut map: ValueMap) -> Self {
        let mut extra = ValueMap::new();
        let open = take_string_list(&mut map, "open", &mut extra);
        extra.extend(map);
        Self { open, extra }
    }

    fn to_map(&self) -> ValueMap {
        let mut map = self.extra.clone();
        put_string_list(&mut map, "open", &self.open);
        map
    }
}

impl PolicyDocument {
    /// Build a document from its map form, keeping ill-typed or unknown
    /// entries in the side tables instead of rejecting them
    pub fn from_map(mut map: ValueMap) -> Self {
        let mut extra = ValueMap::new();
        let imports = take_section(&mut map, "imports", &mut extra, ImportsSection::from_map);
        let network = take_section(&mut map, "network", &mut extra, NetworkSection::from_map);
        let filesystem = take_section(
            &mut map,
            "filesystem",
            &mut extra,
            FilesystemSection::from_map,
        );
        let process = take_section(&mut map, "process", &mut extra, ProcessSection::from_map);
        let system = take_section(&mut map, "system", &mut extra, SystemSection::from_map);
        let mach = take_section(&mut map, "mach", &mut extra, MachSection::from_map);
        let ipc = take_section(&mut map, "ipc", &mut extra, IpcSection::from_map);
        let signal = take_section(&mut map, "signal", &mut extra, SignalSection::from_map);
        let iokit = take_section(&mut map, "iokit", &mut extra, IokitSection::from_map);
        extra.extend(map);
        Self {
            imports,
            network,
            filesystem,
            process,
            system,
            mach,
            ipc,
            signal,
            iokit,
            extra,
        }
    }

    /// Map form consumed by the merge engine. Only explicitly set fields
    /// are emitted, so an absent flag in one document cannot clobber a
    /// value set by an earlier one.
    pub fn to_map(&self) -> ValueMap {
        let mut map = self.extra.clone();
        if let Some(imports) = &self.imports {
            map.insert("imports".to_string(), Value::Map(imports.to_map()));
        }
        if let Some(network) = &self.network {
            map.insert("network".to_string(), Value::Map(network.to_map()));
        }
        if let Some(filesystem) = &self.filesystem {
            map.insert("filesystem".to_string(), Value::Map(filesystem.to_map()));
        }
        if let Some(process) = &self.process {
            map.insert("process".to_string(), Value::Map(process.to_map()));
        }
        if let Some(system) = &self.system {
            map.insert("system".to_string(), Value::Map(system.to_map()));
        }
        if let Some(mach) = &self.mach {
            map.insert("mach".to_string(), Value::Map(mach.to_map()));
        }
        if let Some(ipc) = &self.ipc {
            map.insert("ipc".to_string(), Value::Map(ipc.to_map()));
        }
        if let Some(signal) = &self.signal {
            map.insert("signal".to_string(), Value::Map(signal.to_map()));
        }
        if let Some(iokit) = &self.iokit {
            map.insert("iokit".to_string(), Value::Map(iokit.to_map()));
        }
        map
    }

    /// Environment hint surfaced to the spawned process by the caller
    pub fn network_enabled(&self) -> bool {
        self.network
            .as_ref()
            .and_then(|network| network.enabled)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::value::from_toml_table;

    fn doc(src: &str) -> PolicyDocument {
        let table: toml::Table = toml::from_str(src).unwrap();
        PolicyDocument::from_map(from_toml_table(table))
    }

    #[test]
    fn parses_all_sections() {
        let doc = doc(
            r#"
            [imports]
            system_profiles = ["bsd.sb"]

            [network]
            enabled = true

            [filesystem]
            default_deny = true

            [filesystem.read]
            paths = ["/usr"]
            patterns = ["^/tmp"]

            [process]
            allow_exec = true
            allow_fork = true

            [system]
            allow_sysctl_write = true

            [mach]
            lookup = ["com.apple.SecurityServer"]
            lookup_pattern = ["^com\\.apple\\..*"]

            [ipc]
            allow_posix_shm = true
            posix_shm_names = ["shm-a"]

            [signal]
            target = "same-group"

            [iokit]
            open = ["IOHIDParamUserClient"]
            "#,
        );

        assert_eq!(doc.imports.as_ref().unwrap().system_profiles, ["bsd.sb"]);
        assert_eq!(doc.network.as_ref().unwrap().enabled, Some(true));
        let fs = doc.filesystem.as_ref().unwrap();
        assert_eq!(fs.default_deny, Some(true));
        assert_eq!(fs.read.as_ref().unwrap().paths, ["/usr"]);
        assert_eq!(fs.read.as_ref().unwrap().patterns, ["^/tmp"]);
        assert!(fs.write.is_none());
        assert_eq!(doc.process.as_ref().unwrap().allow_fork, Some(true));
        assert_eq!(doc.system.as_ref().unwrap().allow_sysctl_write, Some(true));
        assert_eq!(doc.mach.as_ref().unwrap().lookup.len(), 1);
        assert_eq!(doc.ipc.as_ref().unwrap().posix_shm_names, ["shm-a"]);
        assert_eq!(
            doc.signal.as_ref().unwrap().target.as_deref(),
            Some("same-group")
        );
        assert_eq!(doc.iokit.as_ref().unwrap().open, ["IOHIDParamUserClient"]);
    }

    #[test]
    fn unknown_keys_round_trip() {
        let doc = doc(
            r#"
            custom_top = "kept"

            [network]
            enabled = true
            custom_nested = 7
            "#,
        );

        assert_eq!(
            doc.extra.get("custom_top"),
            Some(&Value::String("kept".to_string()))
        );
        let network = doc.network.as_ref().unwrap();
        assert_eq!(network.extra.get("custom_nested"), Some(&Value::Integer(7)));

        let map = doc.to_map();
        assert_eq!(
            map.get("custom_top"),
            Some(&Value::String("kept".to_string()))
        );
        let network_map = map.get("network").and_then(Value::as_map).unwrap();
        assert_eq!(network_map.get("custom_nested"), Some(&Value::Integer(7)));
    }

    #[test]
    fn ill_typed_field_lands_in_extra() {
        let doc = doc(
            r#"
            [network]
            enabled = "yes"
            "#,
        );

        let network = doc.network.as_ref().unwrap();
        assert_eq!(network.enabled, None);
        assert_eq!(
            network.extra.get("enabled"),
            Some(&Value::String("yes".to_string()))
        );
    }

    #[test]
    fn unset_flags_are_not_emitted() {
        let doc = doc(
            r#"
            [network]
            allow_localhost = true
            "#,
        );

        let map = doc.to_map();
        let network = map.get("network").and_then(Value::as_map).unwrap();
        assert_eq!(network.get("allow_localhost"), Some(&Value::Bool(true)));
        assert!(!network.contains_key("enabled"));
    }

    #[test]
    fn network_enabled_hint_defaults_to_false() {
        assert!(!PolicyDocument::default().network_enabled());
        assert!(doc("[network]\nenabled = true").network_enabled());
        assert!(!doc("[network]\nallow_localhost = true").network_enabled());
    }
}
