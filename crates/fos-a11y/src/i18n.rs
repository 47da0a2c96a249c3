//! Message catalogs
//!
//! Spanish is the overlay's native language; English is the fallback for
//! any other tag. Spoken number words are recognized in both languages
//! regardless of which one drives the messages.

/// UI language of spoken messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Spanish,
    English,
}

/// What a text control currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueHint<'a> {
    Value(&'a str),
    Placeholder(&'a str),
    Empty,
}

impl<'a> ValueHint<'a> {
    /// Value wins over placeholder; blank strings count as missing
    pub fn new(value: &'a str, placeholder: &'a str) -> Self {
        if !value.trim().is_empty() {
            Self::Value(value)
        } else if !placeholder.trim().is_empty() {
            Self::Placeholder(placeholder)
        } else {
            Self::Empty
        }
    }
}

const NUMBER_WORDS: &[(&str, usize)] = &[
    ("cero", 0), ("zero", 0),
    ("uno", 1), ("una", 1), ("one", 1),
    ("dos", 2), ("two", 2),
    ("tres", 3), ("three", 3),
    ("cuatro", 4), ("four", 4),
    ("cinco", 5), ("five", 5),
    ("seis", 6), ("six", 6),
    ("siete", 7), ("seven", 7),
    ("ocho", 8), ("eight", 8),
    ("nueve", 9), ("nine", 9),
    ("diez", 10), ("ten", 10),
    ("once", 11), ("eleven", 11),
    ("doce", 12), ("twelve", 12),
    ("trece", 13), ("thirteen", 13),
    ("catorce", 14), ("fourteen", 14),
    ("quince", 15), ("fifteen", 15),
    ("dieciseis", 16), ("sixteen", 16),
    ("diecisiete", 17), ("seventeen", 17),
    ("dieciocho", 18), ("eighteen", 18),
    ("diecinueve", 19), ("nineteen", 19),
    ("veinte", 20), ("twenty", 20),
];

/// Number words of the other language that are ordinary words in this one
const FALSE_FRIENDS: &[(Language, &str)] = &[
    (Language::English, "once"),
    (Language::Spanish, "ten"),
];

/// Value of a spoken number word (accent-folded, lowercase)
///
/// Both languages are recognized, except words that mean something else in
/// the listening language.
pub fn number_word(word: &str, lang: Language) -> Option<usize> {
    if FALSE_FRIENDS.iter().any(|&(l, w)| l == lang && w == word) {
        return None;
    }
    NUMBER_WORDS.iter().find(|(w, _)| *w == word).map(|(_, n)| *n)
}

fn minutes_seconds(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

impl Language {
    /// Pick a catalog from a BCP-47 tag by primary subtag
    pub fn from_tag(tag: &str) -> Self {
        let primary = tag.split(['-', '_']).next().unwrap_or("").trim();
        if primary.eq_ignore_ascii_case("es") {
            Self::Spanish
        } else {
            Self::English
        }
    }

    /// Representative tag
    pub fn tag(self) -> &'static str {
        match self {
            Self::Spanish => "es-ES",
            Self::English => "en-US",
        }
    }

    fn pick(self, es: &'static str, en: &'static str) -> &'static str {
        match self {
            Self::Spanish => es,
            Self::English => en,
        }
    }

    fn required(self, required: bool) -> &'static str {
        if required { self.pick(" requerido", " required") } else { "" }
    }

    fn value_hint(self, hint: ValueHint<'_>) -> String {
        match hint {
            ValueHint::Value(v) => format!("{}{}", self.pick("Valor actual: ", "Current value: "), v),
            ValueHint::Placeholder(p) => format!("{}{}", self.pick("Pista: ", "Hint: "), p),
            ValueHint::Empty => self.pick("Vacío", "Empty").to_string(),
        }
    }

    // ------------------------------------------------------------------
    // Element descriptions
    // ------------------------------------------------------------------

    pub fn heading(self, level: u8, text: &str) -> String {
        format!("{} {}. {}", self.pick("Encabezado nivel", "Heading level"), level, text)
    }

    pub fn button(self, text: &str) -> String {
        format!("{}{}", self.pick("Botón: ", "Button: "), text)
    }

    pub fn link(self, text: &str, external: bool) -> String {
        let suffix = if external { self.pick(" Enlace externo.", " External link.") } else { "" };
        format!("{}{}.{}", self.pick("Enlace: ", "Link: "), text, suffix)
    }

    pub fn image(self, alt: &str) -> String {
        format!("{}{}", self.pick("Imagen: ", "Image: "), alt)
    }

    pub fn text_input(self, input_type: &str, label: &str, hint: ValueHint<'_>, required: bool) -> String {
        match self {
            Self::Spanish => format!("Entrada de {}: {}. {}{}", input_type, label, self.value_hint(hint), self.required(required)),
            Self::English => format!("Input {}: {}. {}{}", input_type, label, self.value_hint(hint), self.required(required)),
        }
    }

    pub fn textarea(self, label: &str, hint: ValueHint<'_>, required: bool) -> String {
        format!("{}{}. {}{}", self.pick("Área de texto: ", "Text area: "), label, self.value_hint(hint), self.required(required))
    }

    pub fn select(self, label: &str, selected: Option<&str>, count: usize, required: bool) -> String {
        let selected = selected.unwrap_or(self.pick("Sin selección", "No selection"));
        match self {
            Self::Spanish => format!("Selector: {}. Seleccionado: {}. {} opciones disponibles{}", label, selected, count, self.required(required)),
            Self::English => format!("Selector: {}. Selected: {}. {} options available{}", label, selected, count, self.required(required)),
        }
    }

    /// Header row first, then numbered data rows
    pub fn table(self, header: Option<&str>, rows: &[String]) -> String {
        if header.is_none() && rows.is_empty() {
            return self.pick("Tabla vacía", "Empty table").to_string();
        }
        let mut out = self.pick("Tabla.", "Table.").to_string();
        if let Some(h) = header {
            out.push_str(&format!(" {}{}.", self.pick("Encabezados: ", "Headers: "), h));
        }
        for (i, row) in rows.iter().enumerate() {
            out.push_str(&format!(" {} {}: {}.", self.pick("Fila", "Row"), i + 1, row));
        }
        out
    }

    pub fn fieldset(self, legend: Option<&str>) -> String {
        match legend {
            Some(l) => format!("{}{}.", self.pick("Grupo de formulario: ", "Form group: "), l),
            None => self.pick("Grupo de formulario.", "Form group.").to_string(),
        }
    }

    pub fn question(self, text: &str, options: &[String]) -> String {
        let mut out = format!("{}{}.", self.pick("Pregunta: ", "Question: "), text);
        if !options.is_empty() {
            out.push_str(&format!(" {}{}", self.pick("Opciones: ", "Options: "), options.join(", ")));
        }
        out
    }

    pub fn unnamed_option(self, index: usize) -> String {
        format!("{} {}", self.pick("Opción", "Option"), index + 1)
    }

    pub fn media(self, audio: bool, title: Option<&str>, duration: Option<f64>, paused: bool) -> String {
        let kind = if audio { "Audio" } else { "Video" };
        let title = title.unwrap_or(self.pick("Archivo multimedia", "Media file"));
        let duration = duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(|d| format!(" {}{}.", self.pick("Duración: ", "Duration: "), minutes_seconds(d)))
            .unwrap_or_default();
        let status = if paused { self.pick(" Pausado.", " Paused.") } else { self.pick(" Reproduciéndose.", " Playing.") };
        let action = match (self, paused) {
            (Self::Spanish, true) => " Presiona Enter para reproducir.",
            (Self::Spanish, false) => " Presiona Enter para pausar.",
            (Self::English, true) => " Press Enter to play.",
            (Self::English, false) => " Press Enter to pause.",
        };
        format!("{}: {}.{}{}{}", kind, title, duration, status, action)
    }

    pub fn carousel(self, label: Option<&str>, slides: usize) -> String {
        let head = match label {
            Some(l) => format!("{}{}.", self.pick("Carrusel: ", "Carousel: "), l),
            None => self.pick("Carrusel.", "Carousel.").to_string(),
        };
        match self {
            Self::Spanish => format!("{} {} diapositivas. Presiona Enter para navegar.", head, slides),
            Self::English => format!("{} {} slides. Press Enter to navigate.", head, slides),
        }
    }

    /// Short role-prefixed label for native focus
    pub fn focus_label(self, tag: &str, label: &str) -> String {
        let prefix = match tag {
            "button" => self.pick("Botón: ", "Button: "),
            "a" => self.pick("Enlace: ", "Link: "),
            "input" | "textarea" => self.pick("Entrada: ", "Input: "),
            "select" => self.pick("Lista desplegable: ", "Dropdown: "),
            _ => "",
        };
        format!("{}{}", prefix, label)
    }

    pub fn interactive_fallback(self) -> &'static str {
        self.pick("Elemento interactivo", "Interactive element")
    }

    // ------------------------------------------------------------------
    // Interaction modes
    // ------------------------------------------------------------------

    /// Announced on entering input edit mode
    pub fn input_edit_entered(self, label: &str, control: &str, textarea: bool, hint: ValueHint<'_>) -> String {
        let label = if label.is_empty() { String::new() } else { format!("{}. ", label) };
        let control = if textarea {
            self.pick("Área de texto", "Text area").to_string()
        } else {
            match self {
                Self::Spanish => format!("Entrada de {}", control),
                Self::English => format!("Input {}", control),
            }
        };
        let content = match hint {
            ValueHint::Value(v) => format!("{}{}", self.pick("Contiene: ", "Contains: "), v),
            ValueHint::Placeholder(p) if !textarea => format!("{}{}", self.pick("Pista: ", "Hint: "), p),
            _ => self.pick("Vacío", "Empty").to_string(),
        };
        match self {
            Self::Spanish => format!("Modo edición activado. {}{}. {}. Presiona Escape para salir.", label, control, content),
            Self::English => format!("Edit mode on. {}{}. {}. Press Escape to leave.", label, control, content),
        }
    }

    /// Short hint used when edit mode is entered by voice
    pub fn input_hint(self, placeholder: &str) -> String {
        format!("{}{}", self.pick("Pista: ", "Hint: "), placeholder)
    }

    pub fn input_edit_exited(self, value: &str) -> String {
        let saved = if value.is_empty() {
            self.pick("Sin cambios", "No changes").to_string()
        } else {
            format!("{}{}", self.pick("Valor guardado: ", "Saved value: "), value)
        };
        match self {
            Self::Spanish => format!("Modo edición cerrado. {}. Regresando a navegación.", saved),
            Self::English => format!("Edit mode closed. {}. Back to navigation.", saved),
        }
    }

    pub fn select_empty(self) -> &'static str {
        self.pick("Lista desplegable vacía.", "Empty dropdown.")
    }

    pub fn select_opened(self, label: &str, index: usize, total: usize, option: &str) -> String {
        let label = if label.is_empty() { String::new() } else { format!("{}. ", label) };
        match self {
            Self::Spanish => format!(
                "{}Lista desplegable abierta. Opción {} de {}. {}. Usa las flechas arriba y abajo para navegar, Enter para seleccionar, Escape para cancelar.",
                label, index + 1, total, option
            ),
            Self::English => format!(
                "{}Dropdown open. Option {} of {}. {}. Use the up and down arrows to move, Enter to select, Escape to cancel.",
                label, index + 1, total, option
            ),
        }
    }

    pub fn select_option(self, index: usize, total: usize, option: &str) -> String {
        match self {
            Self::Spanish => format!("Opción {} de {}. {}", index + 1, total, option),
            Self::English => format!("Option {} of {}. {}", index + 1, total, option),
        }
    }

    pub fn select_committed(self, option: &str) -> String {
        format!("{}{}", self.pick("Opción seleccionada: ", "Selected option: "), option)
    }

    pub fn select_closed(self, selected: Option<&str>) -> String {
        let selected = match selected {
            Some(s) => format!("{}{}", self.pick("Seleccionada: ", "Selected: "), s),
            None => self.pick("Sin selección", "No selection").to_string(),
        };
        format!("{}{}", self.pick("Lista desplegable cerrada. ", "Dropdown closed. "), selected)
    }

    pub fn media_toggled(self, audio: bool, playing: bool, title: Option<&str>) -> String {
        let kind = if audio { "Audio" } else { "Video" };
        let title = title.unwrap_or(self.pick("Archivo multimedia", "Media file"));
        let verb = match (self, playing) {
            (Self::Spanish, true) => "reproduciendo",
            (Self::Spanish, false) => "pausado",
            (Self::English, true) => "playing",
            (Self::English, false) => "paused",
        };
        format!("{} {}: {}", kind, verb, title)
    }

    pub fn slider_entered(self) -> &'static str {
        self.pick(
            "Modo de navegación de diapositivas activado. Use flechas para navegar, Enter para interactuar, Escape para salir.",
            "Slide navigation mode on. Use the arrows to move, Enter to interact, Escape to leave.",
        )
    }

    pub fn slider_exited(self) -> &'static str {
        self.pick(
            "Saliste del modo de navegación de diapositivas.",
            "Left slide navigation mode.",
        )
    }

    pub fn slide_position(self, index: usize, total: usize) -> String {
        match self {
            Self::Spanish => format!("Diapositiva {} de {}", index, total),
            Self::English => format!("Slide {} of {}", index, total),
        }
    }

    pub fn slide_no_interactive(self) -> &'static str {
        self.pick(
            "No hay elementos interactivos en esta diapositiva.",
            "There are no interactive elements on this slide.",
        )
    }

    pub fn slide_many_interactive(self, count: usize) -> String {
        match self {
            Self::Spanish => format!("Hay {} elementos interactivos en esta diapositiva. Use Tab para navegar entre ellos.", count),
            Self::English => format!("There are {} interactive elements on this slide. Use Tab to move between them.", count),
        }
    }

    // ------------------------------------------------------------------
    // Notices
    // ------------------------------------------------------------------

    pub fn not_found(self, number: usize) -> String {
        match self {
            Self::Spanish => format!("Elemento {} no encontrado.", number),
            Self::English => format!("Item {} not found.", number),
        }
    }

    pub fn speech_unavailable(self) -> &'static str {
        self.pick("Tu navegador no soporta TTS.", "Your browser does not support text to speech.")
    }

    pub fn recognition_unavailable(self) -> &'static str {
        self.pick(
            "Tu navegador no soporta reconocimiento de voz.",
            "Your browser does not support speech recognition.",
        )
    }

    pub fn nothing_to_read(self) -> &'static str {
        self.pick("No se encontró texto para leer.", "No text found to read.")
    }

    pub fn select_text_prompt(self) -> &'static str {
        self.pick("Por favor, selecciona algún texto.", "Please select some text.")
    }

    pub fn selection_opted_out(self) -> &'static str {
        self.pick(
            "El texto seleccionado está marcado para no leerse.",
            "The selected text is marked as not readable.",
        )
    }

    pub fn settings_reset(self) -> &'static str {
        self.pick("Configuración restablecida.", "Settings reset.")
    }
}
